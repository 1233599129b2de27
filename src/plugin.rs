//! Constructing live plugin instances from defined units.
//!
//! Units are constructed without arguments: the component is instantiated
//! through a linker that provides no imports, then checked against the
//! lifecycle contract in [`crate::capability`].

use std::sync::Arc ;
use thiserror::Error ;
use wasmtime::{ Engine, Store };
use wasmtime::component::Linker ;

use crate::capability::{ CapabilityError, LifecycleExports };
use crate::loader::UnitDescriptor ;
use crate::plugin_instance::{ CallError, PluginInstance };



/// Data stored inside a unit's wasmtime `Store`.
#[derive( Debug )]
pub struct UnitContext {
	unit: String,
}

impl UnitContext {

	pub fn new( unit: impl Into<String> ) -> Self {
		Self { unit: unit.into() }
	}

	/// Name of the unit this store belongs to.
	#[inline] pub fn unit( &self ) -> &str { &self.unit }

}

/// Errors that can occur while constructing a plugin instance.
#[derive( Error, Debug )]
pub enum InstantiateError {
	/// The unit does not satisfy the lifecycle contract.
	#[error( "Incompatible unit: {0}" )] Incompatible( #[from] CapabilityError ),
	/// wasmtime refused to instantiate the component.
	#[error( "Instantiation failed: {0}" )] Instantiation( wasmtime::Error ),
	/// A lifecycle call made during construction failed.
	#[error( "Lifecycle call failed: {0}" )] Call( #[from] CallError ),
}

/// A defined unit bundled with its runtime context, ready for instantiation.
#[must_use = "call .instantiate() to create a PluginInstance"]
pub struct Plugin {
	/// The defined unit
	descriptor: Arc<UnitDescriptor>,
	/// Context consumed at instantiation to become `Store<UnitContext>`
	context: UnitContext,
}

impl Plugin {

	pub fn new( descriptor: Arc<UnitDescriptor> ) -> Self {
		let context = UnitContext::new( descriptor.name() );
		Self { descriptor, context }
	}

	/// Instantiates the unit and verifies it exports the lifecycle interface found at
	/// `interface_path`.
	///
	/// The linker is expected to be empty; any import the component declares makes it
	/// incompatible with the zero-argument construction protocol.
	///
	/// # Errors
	/// [`InstantiateError::Incompatible`] if the contract is not met,
	/// [`InstantiateError::Instantiation`] if wasmtime fails to instantiate,
	/// [`InstantiateError::Call`] if reading the unit's metadata traps.
	pub fn instantiate(
		self,
		engine: &Engine,
		linker: &Linker<UnitContext>,
		interface_path: &str,
	) -> Result<PluginInstance, InstantiateError> {

		let component = self.descriptor.component();
		if let Some(( name, _ )) = component.component_type().imports( engine ).next() {
			return Err( CapabilityError::UnexpectedImport( name.to_string() ).into() );
		}

		let mut store = Store::new( engine, self.context );
		let instance = linker.instantiate( &mut store, component ).map_err( InstantiateError::Instantiation )?;
		let lifecycle = LifecycleExports::bind( &mut store, &instance, interface_path )?;

		Ok( PluginInstance::new( self.descriptor, store, lifecycle )? )

	}

}

impl std::fmt::Debug for Plugin {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Plugin" )
			.field( "descriptor", &self.descriptor )
			.field( "context", &self.context )
			.finish()
	}
}
