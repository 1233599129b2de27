use std::sync::{ Arc, Mutex };
use thiserror::Error ;
use tracing::warn ;
use wasmtime::Store ;
use wasmtime::component::{ ComponentNamedList, Lift, TypedFunc };

use crate::capability::{ LifecycleExports, LifecycleFunction };
use crate::host::MenuHandle ;
use crate::loader::UnitDescriptor ;
use crate::plugin::UnitContext ;



/// An instantiated unit that satisfied the lifecycle contract.
///
/// Created by [`Plugin::instantiate`]( crate::Plugin::instantiate ). The instance owns its
/// wasmtime [`Store`]; calls into the unit are serialized through an internal lock so
/// the instance can be shared between threads.
///
/// The descriptive accessors (`display_name`, `source_file_name`, `description`,
/// `menu_handle`) are read from the unit once, at construction.
pub struct PluginInstance {
	descriptor: Arc<UnitDescriptor>,
	runtime: Mutex<Runtime>,
	display_name: String,
	source_file_name: String,
	description: String,
	menu_id: u32,
}

struct Runtime {
	store: Store<UnitContext>,
	lifecycle: LifecycleExports,
}

impl std::fmt::Debug for PluginInstance {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::result::Result<(), std::fmt::Error> {
		f.debug_struct( "PluginInstance" )
			.field( "type_id", &self.type_id() )
			.field( "display_name", &self.display_name )
			.field( "source_file_name", &self.source_file_name )
			.field( "description", &self.description )
			.field( "menu_id", &self.menu_id )
			.finish_non_exhaustive()
	}
}

/// Errors that can occur when calling a lifecycle function.
#[derive( Error, Debug )]
pub enum CallError {
	/// Failed to acquire the instance lock (a previous call panicked).
	#[error( "Lock Rejected" )] LockRejected,
	/// The unit trapped while executing the function.
	#[error( "Runtime Exception in {0}: {1}" )] RuntimeException( LifecycleFunction, wasmtime::Error ),
}

impl PluginInstance {

	pub(crate) fn new(
		descriptor: Arc<UnitDescriptor>,
		mut store: Store<UnitContext>,
		lifecycle: LifecycleExports,
	) -> Result<Self, CallError> {
		let ( display_name, ) = call( &mut store, &lifecycle.display_name, LifecycleFunction::DisplayName )?;
		let ( source_file_name, ) = call( &mut store, &lifecycle.source_file_name, LifecycleFunction::SourceFileName )?;
		let ( description, ) = call( &mut store, &lifecycle.description, LifecycleFunction::Description )?;
		let ( menu_id, ) = call( &mut store, &lifecycle.menu_handle, LifecycleFunction::MenuHandle )?;
		Ok( Self {
			descriptor,
			runtime: Mutex::new( Runtime { store, lifecycle }),
			display_name,
			source_file_name,
			description,
			menu_id,
		})
	}

	/// The registry key of this instance: the unit's qualified name.
	#[inline] pub fn type_id( &self ) -> &str { self.descriptor.name() }
	#[inline] pub fn descriptor( &self ) -> &UnitDescriptor { &self.descriptor }
	#[inline] pub fn display_name( &self ) -> &str { &self.display_name }
	#[inline] pub fn source_file_name( &self ) -> &str { &self.source_file_name }
	#[inline] pub fn description( &self ) -> &str { &self.description }

	/// Handle used to attach this instance to the host menu.
	pub fn menu_handle( &self ) -> MenuHandle {
		MenuHandle::new( self.type_id(), self.menu_id, &self.display_name )
	}

	/// Runs the unit's `init` function.
	///
	/// # Errors
	/// Fails if the unit traps or the instance lock is poisoned.
	pub fn init( &self ) -> Result<(), CallError> {
		let mut runtime = self.runtime.lock().map_err(|_| CallError::LockRejected )?;
		let Runtime { store, lifecycle } = &mut *runtime ;
		call( store, &lifecycle.init, LifecycleFunction::Init )
	}

	/// Runs the unit's `halt` function.
	///
	/// # Errors
	/// Fails if the unit traps or the instance lock is poisoned.
	pub fn halt( &self ) -> Result<(), CallError> {
		let mut runtime = self.runtime.lock().map_err(|_| CallError::LockRejected )?;
		let Runtime { store, lifecycle } = &mut *runtime ;
		call( store, &lifecycle.halt, LifecycleFunction::Halt )
	}

}

fn call<Results>(
	store: &mut Store<UnitContext>,
	func: &TypedFunc<(), Results>,
	function: LifecycleFunction,
) -> Result<Results, CallError>
where
	Results: ComponentNamedList + Lift + 'static,
{
	let results = func.call( &mut *store, () ).map_err(| err | CallError::RuntimeException( function, err ))?;
	if let Err( err ) = func.post_return( &mut *store ) {
		warn!( target: "wasm_mount::plugin_instance", function = %function, error = %err, "post-return cleanup failed" );
		return Err( CallError::RuntimeException( function, err ));
	}
	Ok( results )
}
