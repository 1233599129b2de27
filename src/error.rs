use std::io ;
use thiserror::Error ;

use crate::archive::ArchiveError ;
use crate::capability::CapabilityError ;
use crate::host::HostError ;
use crate::loader::LoadError ;
use crate::origin::ResolveError ;
use crate::plugin::InstantiateError ;
use crate::plugin_instance::CallError ;
use crate::registry::CapacityExceeded ;



/// Flat classification of a [`MountError`].
#[derive( Copy, Clone, Debug, PartialEq, Eq, Hash )]
pub enum ErrorKind {
	NotFound,
	MalformedPayload,
	IncompatibleUnit,
	CapacityExceeded,
	Io,
	ArchiveFormat,
	HostCallbackFailed,
	Instantiation,
	NotMounted,
}

/// Everything that can go wrong while mounting or unmounting a unit.
#[derive( Error, Debug )]
pub enum MountError {
	/// No payload exists for the requested unit or source.
	#[error( "Not found: {0}" )] NotFound( String ),
	/// The payload is not a loadable component.
	#[error( "Malformed payload for '{0}': {1}" )] MalformedPayload( String, wasmtime::Error ),
	/// The unit does not satisfy the lifecycle contract.
	#[error( "Incompatible unit '{0}': {1}" )] IncompatibleUnit( String, CapabilityError ),
	#[error( "{0}" )] CapacityExceeded( #[from] CapacityExceeded ),
	#[error( "I/O failure on '{0}': {1}" )] Io( String, #[source] io::Error ),
	#[error( "Invalid archive: {0}" )] ArchiveFormat( String ),
	/// The host refused to attach the unit; the mount was rolled back.
	#[error( "Host rejected '{0}': {1}" )] HostCallbackFailed( String, HostError ),
	/// Constructing the unit, or its `init`, failed.
	#[error( "Failed to instantiate '{0}': {1}" )] Instantiation( String, String ),
	#[error( "Unit '{0}' is not mounted" )] NotMounted( String ),
}

impl MountError {

	pub fn kind( &self ) -> ErrorKind {
		match self {
			Self::NotFound( .. ) => ErrorKind::NotFound,
			Self::MalformedPayload( .. ) => ErrorKind::MalformedPayload,
			Self::IncompatibleUnit( .. ) => ErrorKind::IncompatibleUnit,
			Self::CapacityExceeded( .. ) => ErrorKind::CapacityExceeded,
			Self::Io( .. ) => ErrorKind::Io,
			Self::ArchiveFormat( .. ) => ErrorKind::ArchiveFormat,
			Self::HostCallbackFailed( .. ) => ErrorKind::HostCallbackFailed,
			Self::Instantiation( .. ) => ErrorKind::Instantiation,
			Self::NotMounted( .. ) => ErrorKind::NotMounted,
		}
	}

	/// Attaches the unit name to an instantiation failure.
	pub(crate) fn instantiate( unit: &str, err: InstantiateError ) -> Self {
		match err {
			InstantiateError::Incompatible( err ) => Self::IncompatibleUnit( unit.to_string(), err ),
			InstantiateError::Instantiation( err ) => Self::Instantiation( unit.to_string(), err.to_string() ),
			InstantiateError::Call( err ) => Self::call( unit, err ),
		}
	}

	pub(crate) fn call( unit: &str, err: CallError ) -> Self {
		Self::Instantiation( unit.to_string(), err.to_string() )
	}

}

impl From<ArchiveError> for MountError {
	fn from( err: ArchiveError ) -> Self {
		match err {
			ArchiveError::NotFound( path ) => Self::NotFound( path.display().to_string() ),
			ArchiveError::Io( err ) => Self::Io( "archive".to_string(), err ),
			ArchiveError::Format( message ) => Self::ArchiveFormat( message ),
		}
	}
}

impl From<ResolveError> for MountError {
	fn from( err: ResolveError ) -> Self {
		match err {
			ResolveError::NotFound( .. ) => Self::NotFound( err.to_string() ),
			ResolveError::Io( path, err ) => Self::Io( path, err ),
		}
	}
}

impl From<LoadError> for MountError {
	fn from( err: LoadError ) -> Self {
		match err {
			LoadError::InvalidName( name ) => Self::NotFound( format!( "invalid unit name '{}'", name )),
			LoadError::Resolve( err ) => err.into(),
			LoadError::MalformedPayload( name, err ) => Self::MalformedPayload( name, err ),
			// A fresh loader serves every mount request, so this only surfaces through `define`.
			LoadError::AlreadyDefined( name ) => Self::Instantiation( name, "unit is already defined".to_string() ),
		}
	}
}

#[cfg( test )]
mod tests {

	use super::* ;
	use crate::registry::Bound ;

	#[test]
	fn lower_level_errors_keep_their_kind() {
		let err: MountError = ArchiveError::Format( "bad".to_string() ).into();
		assert_eq!( err.kind(), ErrorKind::ArchiveFormat );

		let err: MountError = ArchiveError::Io( io::Error::from( io::ErrorKind::UnexpectedEof )).into();
		assert_eq!( err.kind(), ErrorKind::Io );

		let err: MountError = CapacityExceeded { bound: Bound::Registry, capacity: 2 }.into();
		assert_eq!( err.kind(), ErrorKind::CapacityExceeded );

		let err: MountError = LoadError::InvalidName( "a..b".to_string() ).into();
		assert_eq!( err.kind(), ErrorKind::NotFound );
	}

	#[test]
	fn trap_during_construction_is_an_instantiation_failure() {
		let err = MountError::call( "Foo", CallError::LockRejected );
		assert_eq!( err.kind(), ErrorKind::Instantiation );
		assert!( err.to_string().contains( "Foo" ));
	}

}
