//! The lifecycle contract every mountable unit exports.
//!
//! A unit satisfies the contract if its component exports an instance under the
//! lifecycle interface path (by default `wasm-mount:plugin/lifecycle`) containing
//! all of the following functions with exactly these signatures:
//!
//! ```wit
//! interface lifecycle {
//! 	init: func();
//! 	halt: func();
//! 	display-name: func() -> string;
//! 	source-file-name: func() -> string;
//! 	description: func() -> string;
//! 	menu-handle: func() -> u32;
//! }
//! ```
//!
//! The check runs once, right after instantiation.

use thiserror::Error ;
use wasmtime::Store ;
use wasmtime::component::{ ComponentExportIndex, ComponentNamedList, Instance, Lift, Lower, TypedFunc };



/// Default WIT path of the lifecycle interface.
pub const DEFAULT_LIFECYCLE_INTERFACE: &str = "wasm-mount:plugin/lifecycle" ;

/// The functions of the lifecycle interface.
#[derive( Copy, Clone, Debug, Eq, PartialEq, Hash )]
pub enum LifecycleFunction {
	Init,
	Halt,
	DisplayName,
	SourceFileName,
	Description,
	MenuHandle,
}

impl LifecycleFunction {

	/// Export name as declared in WIT.
	pub const fn name( self ) -> &'static str {
		match self {
			Self::Init => "init",
			Self::Halt => "halt",
			Self::DisplayName => "display-name",
			Self::SourceFileName => "source-file-name",
			Self::Description => "description",
			Self::MenuHandle => "menu-handle",
		}
	}

	/// What the function is expected to return.
	pub const fn return_kind( self ) -> ReturnKind {
		match self {
			Self::Init | Self::Halt => ReturnKind::Void,
			Self::DisplayName | Self::SourceFileName | Self::Description => ReturnKind::String,
			Self::MenuHandle => ReturnKind::U32,
		}
	}

}

impl std::fmt::Display for LifecycleFunction {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { f.write_str( self.name() )}
}

/// Result type of a lifecycle function.
#[derive( Copy, Clone, Eq, PartialEq, Hash, Debug )]
pub enum ReturnKind {
	Void,
	String,
	U32,
}

impl std::fmt::Display for ReturnKind {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> Result<(), std::fmt::Error> {
		match self {
			Self::Void => write!( f, "func()" ),
			Self::String => write!( f, "func() -> string" ),
			Self::U32 => write!( f, "func() -> u32" ),
		}
	}
}

/// Ways a unit can fail the lifecycle contract.
#[derive( Error, Debug )]
pub enum CapabilityError {
	/// The unit imports something; the construction protocol provides no imports.
	#[error( "Unexpected import: {0}" )] UnexpectedImport( String ),
	/// The lifecycle interface is not exported at all.
	#[error( "Missing interface export: {0}" )] MissingInterface( String ),
	/// The interface lacks one of the lifecycle functions.
	#[error( "Missing function: {0}" )] MissingFunction( LifecycleFunction ),
	/// A lifecycle function exists with the wrong signature.
	#[error( "Signature mismatch for {}, expected {}: {}", .0, .0.return_kind(), .1 )] SignatureMismatch( LifecycleFunction, wasmtime::Error ),
}

/// Typed handles to a verified unit's lifecycle functions.
pub(crate) struct LifecycleExports {
	pub init: TypedFunc<(), ()>,
	pub halt: TypedFunc<(), ()>,
	pub display_name: TypedFunc<(), ( String, )>,
	pub source_file_name: TypedFunc<(), ( String, )>,
	pub description: TypedFunc<(), ( String, )>,
	pub menu_handle: TypedFunc<(), ( u32, )>,
}

impl LifecycleExports {

	/// Verifies `instance` against the contract and binds its functions.
	pub(crate) fn bind<T: 'static>(
		store: &mut Store<T>,
		instance: &Instance,
		interface_path: &str,
	) -> Result<Self, CapabilityError> {

		let interface = instance
			.get_export_index( &mut *store, None, interface_path )
			.ok_or_else(|| CapabilityError::MissingInterface( interface_path.to_string() ))?;

		Ok( Self {
			init: typed_func( store, instance, &interface, LifecycleFunction::Init )?,
			halt: typed_func( store, instance, &interface, LifecycleFunction::Halt )?,
			display_name: typed_func( store, instance, &interface, LifecycleFunction::DisplayName )?,
			source_file_name: typed_func( store, instance, &interface, LifecycleFunction::SourceFileName )?,
			description: typed_func( store, instance, &interface, LifecycleFunction::Description )?,
			menu_handle: typed_func( store, instance, &interface, LifecycleFunction::MenuHandle )?,
		})

	}

}

fn typed_func<T, Params, Results>(
	store: &mut Store<T>,
	instance: &Instance,
	interface: &ComponentExportIndex,
	function: LifecycleFunction,
) -> Result<TypedFunc<Params, Results>, CapabilityError>
where
	T: 'static,
	Params: ComponentNamedList + Lower + 'static,
	Results: ComponentNamedList + Lift + 'static,
{
	let index = instance
		.get_export_index( &mut *store, Some( interface ), function.name() )
		.ok_or( CapabilityError::MissingFunction( function ))?;
	instance
		.get_typed_func::<Params, Results>( &mut *store, index )
		.map_err(| err | CapabilityError::SignatureMismatch( function, err ))
}

#[cfg( test )]
mod tests {

	use super::* ;

	const ALL: [LifecycleFunction; 6] = [
		LifecycleFunction::Init,
		LifecycleFunction::Halt,
		LifecycleFunction::DisplayName,
		LifecycleFunction::SourceFileName,
		LifecycleFunction::Description,
		LifecycleFunction::MenuHandle,
	];

	#[test]
	fn every_function_has_a_distinct_export_name() {
		let mut names = ALL.iter().map(| function | function.name() ).collect::<Vec<_>>();
		names.sort_unstable();
		names.dedup();
		assert_eq!( names.len(), ALL.len() );
	}

	#[test]
	fn accessors_return_strings_and_handles() {
		assert_eq!( LifecycleFunction::Init.return_kind(), ReturnKind::Void );
		assert_eq!( LifecycleFunction::Description.return_kind(), ReturnKind::String );
		assert_eq!( LifecycleFunction::MenuHandle.return_kind(), ReturnKind::U32 );
		assert_eq!( LifecycleFunction::SourceFileName.to_string(), "source-file-name" );
		assert_eq!( LifecycleFunction::Halt.return_kind().to_string(), "func()" );
	}

}
