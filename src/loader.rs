//! Turning resolved payloads into defined units.
//!
//! A [`UnitLoader`] owns one origin and compiles each unit name it is asked for
//! exactly once. Later requests for the same name are served from the loader's
//! cache without touching the origin again.

use std::collections::HashMap ;
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use thiserror::Error ;
use tracing::{ debug, info };
use wasmtime::Engine ;
use wasmtime::component::Component ;

use crate::naming::UnitNaming ;
use crate::origin::{ ArchiveOrigin, DirectoryOrigin, Origin, OriginDescription, ResolveError, Resolver };



/// Errors that can occur while loading a unit.
#[derive( Error, Debug )]
pub enum LoadError {
	/// The name is empty or has an empty namespace segment.
	#[error( "Invalid unit name: '{0}'" )] InvalidName( String ),
	/// The origin could not produce a payload.
	#[error( "{0}" )] Resolve( #[from] ResolveError ),
	/// The payload is not a valid WebAssembly component.
	#[error( "Malformed payload for '{0}': {1}" )] MalformedPayload( String, wasmtime::Error ),
	/// The name was already defined by this loader.
	#[error( "Unit '{0}' is already defined" )] AlreadyDefined( String ),
}

/// A resolved and defined unit.
///
/// Descriptors are only handed out after their payload compiled successfully, so a
/// half-defined unit is never observable.
pub struct UnitDescriptor {
	name: String,
	origin: OriginDescription,
	bytes: Arc<[u8]>,
	component: Component,
	defined: bool,
}

impl UnitDescriptor {

	/// Qualified unit name; also the type identifier of its instances.
	#[inline] pub fn name( &self ) -> &str { &self.name }
	#[inline] pub fn origin( &self ) -> &OriginDescription { &self.origin }
	/// The raw payload the component was compiled from.
	#[inline] pub fn bytes( &self ) -> &[u8] { &self.bytes }
	#[inline] pub fn component( &self ) -> &Component { &self.component }
	#[inline] pub fn is_defined( &self ) -> bool { self.defined }

}

impl std::fmt::Debug for UnitDescriptor {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "UnitDescriptor" )
			.field( "name", &self.name )
			.field( "origin", &self.origin )
			.field( "bytes", &format!( "Payload[len={}]", self.bytes.len() ))
			.field( "component", &"<Component>" )
			.field( "defined", &self.defined )
			.finish()
	}
}

/// Loads units from a single origin, defining each name at most once.
///
/// # Type Parameters
/// - `R`: the origin the loader resolves payloads from
pub struct UnitLoader<R> {
	engine: Engine,
	resolver: R,
	naming: UnitNaming,
	defined: Mutex<HashMap<String, Arc<UnitDescriptor>>>,
}

/// Loader backed by a directory of loose unit files.
pub type DirectoryLoader = UnitLoader<DirectoryOrigin> ;
/// Loader backed by an opened archive.
pub type ArchiveLoader = UnitLoader<ArchiveOrigin> ;

impl<R: Resolver> UnitLoader<R> {

	pub fn new( engine: &Engine, resolver: R, naming: UnitNaming ) -> Self {
		Self {
			engine: engine.clone(),
			resolver,
			naming,
			defined: Mutex::new( HashMap::new() ),
		}
	}

	#[inline] pub fn resolver( &self ) -> &R { &self.resolver }

	/// Resolves and defines `unit`, or returns the descriptor defined earlier.
	///
	/// # Errors
	/// [`LoadError::Resolve`] if the origin has no usable payload,
	/// [`LoadError::MalformedPayload`] if it does not compile.
	pub fn load( &self, unit: &str ) -> Result<Arc<UnitDescriptor>, LoadError> {

		let name = self.qualified_name( unit )?;
		let mut defined = self.lock();
		if let Some( descriptor ) = defined.get( &name ) {
			debug!( target: "wasm_mount::loader", unit = %name, "unit already defined, reusing descriptor" );
			return Ok( Arc::clone( descriptor ));
		}

		let bytes = self.resolver.resolve( &name )?;
		let descriptor = Arc::new( self.materialize( name.clone(), bytes )? );
		defined.insert( name, Arc::clone( &descriptor ));
		Ok( descriptor )

	}

	/// Defines `unit` from an explicit payload, bypassing the origin.
	///
	/// # Errors
	/// [`LoadError::AlreadyDefined`] if this loader already defined the name,
	/// [`LoadError::MalformedPayload`] if the payload does not compile.
	pub fn define( &self, unit: &str, bytes: impl Into<Arc<[u8]>> ) -> Result<Arc<UnitDescriptor>, LoadError> {
		let name = self.qualified_name( unit )?;
		let mut defined = self.lock();
		if defined.contains_key( &name ) { return Err( LoadError::AlreadyDefined( name )) }
		let descriptor = Arc::new( self.materialize( name.clone(), bytes.into() )? );
		defined.insert( name, Arc::clone( &descriptor ));
		Ok( descriptor )
	}

	/// Returns `true` if `unit` has been defined by this loader.
	pub fn is_defined( &self, unit: &str ) -> bool {
		self.naming.qualified_name( unit ).is_some_and(| name | self.lock().contains_key( &name ))
	}

	/// Names defined so far, sorted.
	pub fn defined_units( &self ) -> Vec<String> {
		let mut names = self.lock().keys().cloned().collect::<Vec<_>>();
		names.sort_unstable();
		names
	}

	fn qualified_name( &self, unit: &str ) -> Result<String, LoadError> {
		self.naming.qualified_name( unit ).ok_or_else(|| LoadError::InvalidName( unit.to_string() ))
	}

	fn materialize( &self, name: String, bytes: Arc<[u8]> ) -> Result<UnitDescriptor, LoadError> {
		let component = match Component::new( &self.engine, &*bytes ) {
			Ok( component ) => component,
			Err( err ) => return Err( LoadError::MalformedPayload( name, err )),
		};
		let origin = self.resolver.describe();
		info!( target: "wasm_mount::loader", unit = %name, origin = %origin, size = bytes.len(), "unit defined" );
		Ok( UnitDescriptor { name, origin, bytes, component, defined: true })
	}

	// The cache is only mutated after a successful compile, so a poisoned lock still
	// guards a consistent map.
	fn lock( &self ) -> MutexGuard<'_, HashMap<String, Arc<UnitDescriptor>>> {
		self.defined.lock().unwrap_or_else( PoisonError::into_inner )
	}

}

impl UnitLoader<Origin> {

	/// Opens the origin at `path` and wraps it in a loader, choosing the backend
	/// from the path's extension.
	///
	/// # Errors
	/// Propagates archive failures when `path` names an archive.
	pub fn open(
		engine: &Engine,
		path: impl Into<std::path::PathBuf>,
		naming: UnitNaming,
		archive_subdir: &str,
	) -> Result<Self, crate::archive::ArchiveError> {
		let origin = Origin::open( path, naming.clone(), archive_subdir )?;
		Ok( Self::new( engine, origin, naming ))
	}

}
