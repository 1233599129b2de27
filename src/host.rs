//! The boundary to the host application that displays mounted units.

/// Error raised by a host callback.
pub type HostError = Box<dyn std::error::Error + Send + Sync> ;

/// What the host needs to attach a unit to (and later detach it from) its menu.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct MenuHandle {
	type_id: String,
	id: u32,
	label: String,
}

impl MenuHandle {

	pub fn new( type_id: impl Into<String>, id: u32, label: impl Into<String> ) -> Self {
		Self { type_id: type_id.into(), id, label: label.into() }
	}

	/// Type identifier of the unit the handle belongs to.
	#[inline] pub fn type_id( &self ) -> &str { &self.type_id }
	/// Menu id chosen by the unit itself.
	#[inline] pub fn id( &self ) -> u32 { self.id }
	/// Label to show, the unit's display name.
	#[inline] pub fn label( &self ) -> &str { &self.label }

}

/// Callbacks into the host application.
///
/// Implementations must be shareable across threads since mount requests can come
/// from several call paths at once.
pub trait Host: Send + Sync {

	/// Attaches a freshly mounted unit. Any error aborts the mount.
	///
	/// # Errors
	/// Implementations report why the handle could not be attached.
	fn insert_into_menu( &self, handle: &MenuHandle ) -> Result<(), HostError> ;

	/// Detaches an unmounted unit. Errors are logged but do not stop the unmount.
	///
	/// # Errors
	/// Implementations report why the handle could not be detached.
	fn remove_from_menu( &self, handle: &MenuHandle ) -> Result<(), HostError> ;

	/// Advisory progress and error messages.
	fn report( &self, message: &str );

}
