//! The mount/unmount state machine.
//!
//! ```text
//! UNLOADED --resolve+load ok--> LOADED --host accepts--> MOUNTED
//! LOADED   --resolve+load fail--> UNLOADED (reported)
//! MOUNTED  --unmount--> UNLOADED
//! ```
//!
//! Requests are identified by their source path. Requesting a path that is already
//! in the [`PathHistory`] while a unit loaded from it is still registered unloads
//! that unit first, so a changed payload replaces the old instance.

use std::collections::HashMap ;
use std::path::{ Path, PathBuf };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use itertools::Itertools ;
use tracing::{ debug, info, warn };
use wasmtime::Engine ;
use wasmtime::component::Linker ;

use crate::config::{ ConfigError, MountConfig };
use crate::error::MountError ;
use crate::host::Host ;
use crate::loader::{ UnitDescriptor, UnitLoader };
use crate::naming::UnitNaming ;
use crate::origin::{ ArchiveOrigin, DirectoryOrigin, Origin };
use crate::plugin::Plugin ;
use crate::plugin_instance::PluginInstance ;
use crate::registry::{ Bound, CapacityExceeded, PluginState, Registry };
use crate::utils::PartialSuccess ;



/// A request to mount the unit found at `source`.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct MountRequest {
	source: PathBuf,
	unit: Option<String>,
}

impl MountRequest {

	/// Requests the default unit of `source`: the stem of an archive or a loose file.
	pub fn new( source: impl Into<PathBuf> ) -> Self {
		Self { source: source.into(), unit: None }
	}

	/// Names the unit to load from the source explicitly. Required for directories.
	pub fn with_unit( mut self, unit: impl Into<String> ) -> Self {
		self.unit = Some( unit.into() );
		self
	}

	#[inline] pub fn source( &self ) -> &Path { &self.source }
	#[inline] pub fn unit( &self ) -> Option<&str> { self.unit.as_deref() }

}

impl From<PathBuf> for MountRequest {
	fn from( source: PathBuf ) -> Self { Self::new( source ) }
}

impl From<&Path> for MountRequest {
	fn from( source: &Path ) -> Self { Self::new( source ) }
}

impl From<&str> for MountRequest {
	fn from( source: &str ) -> Self { Self::new( source ) }
}

/// How a successful mount request ended.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub enum MountOutcome {
	/// A new instance was created and accepted by the host.
	Mounted( String ),
	/// A new instance was created; there is no host to attach it to.
	Loaded( String ),
	/// An instance of this type was already registered and has been left untouched.
	AlreadyMounted( String ),
}

impl MountOutcome {
	pub fn type_id( &self ) -> &str {
		match self {
			Self::Mounted( type_id ) | Self::Loaded( type_id ) | Self::AlreadyMounted( type_id ) => type_id,
		}
	}
}

/// Bounded, ordered record of every source path requested so far.
#[derive( Debug, Clone )]
pub struct PathHistory {
	capacity: usize,
	paths: Vec<PathBuf>,
}

impl PathHistory {

	pub fn new( capacity: usize ) -> Self {
		Self { capacity, paths: Vec::new() }
	}

	pub fn contains( &self, path: &Path ) -> bool {
		self.paths.iter().any(| known | known == path )
	}

	/// Appends `path` unless it is already present. Returns whether it was appended.
	///
	/// # Errors
	/// [`CapacityExceeded`] if `path` is new and the history is full.
	pub fn push( &mut self, path: &Path ) -> Result<bool, CapacityExceeded> {
		if self.contains( path ) { return Ok( false ) }
		if self.paths.len() >= self.capacity {
			return Err( CapacityExceeded { bound: Bound::PathHistory, capacity: self.capacity });
		}
		self.paths.push( path.to_path_buf() );
		Ok( true )
	}

	#[inline] pub fn len( &self ) -> usize { self.paths.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.paths.is_empty() }
	#[inline] pub fn capacity( &self ) -> usize { self.capacity }
	#[inline] pub fn paths( &self ) -> &[PathBuf] { &self.paths }

}

struct Session {
	history: PathHistory,
	/// Source path of every instance this orchestrator created and still holds.
	sources: HashMap<PathBuf, String>,
}

/// Ties resolution, loading, the registry and the host together.
///
/// All mount and unmount requests are serialized; the registry lock is only ever
/// taken while the orchestrator's own lock is held, never the other way around.
pub struct Orchestrator {
	engine: Engine,
	config: MountConfig,
	naming: UnitNaming,
	registry: Arc<Registry<PluginInstance>>,
	host: Option<Arc<dyn Host>>,
	session: Mutex<Session>,
}

impl Orchestrator {

	/// Creates an orchestrator that registers instances in `registry`.
	///
	/// # Errors
	/// Any [`ConfigError`] from validating `config`.
	pub fn new( config: MountConfig, registry: Arc<Registry<PluginInstance>> ) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok( Self {
			engine: Engine::default(),
			naming: config.naming(),
			session: Mutex::new( Session {
				history: PathHistory::new( config.history_capacity ),
				sources: HashMap::new(),
			}),
			config,
			registry,
			host: None,
		})
	}

	/// Creates an orchestrator with its own registry sized by `config`.
	///
	/// # Errors
	/// Any [`ConfigError`] from validating `config`.
	pub fn from_config( config: MountConfig ) -> Result<Self, ConfigError> {
		let registry = Arc::new( Registry::new( config.registry_capacity ));
		Self::new( config, registry )
	}

	/// Attaches the host that is told about mounted units and failures.
	pub fn with_host( mut self, host: Arc<dyn Host> ) -> Self {
		self.host = Some( host );
		self
	}

	/// Replaces the default engine units are compiled with.
	pub fn with_engine( mut self, engine: Engine ) -> Self {
		self.engine = engine ;
		self
	}

	#[inline] pub fn config( &self ) -> &MountConfig { &self.config }
	#[inline] pub fn engine( &self ) -> &Engine { &self.engine }
	#[inline] pub fn registry( &self ) -> &Arc<Registry<PluginInstance>> { &self.registry }

	/// Mounts the unit described by `request`.
	///
	/// # Errors
	/// Every failure is also reported to the host before it is returned.
	pub fn mount( &self, request: impl Into<MountRequest> ) -> Result<MountOutcome, MountError> {
		self.mount_reporting( &request.into(), true )
	}

	/// Like [`Self::mount`], but success is not announced to the host. Failures are.
	///
	/// # Errors
	/// As [`Self::mount`].
	pub fn mount_quietly( &self, request: impl Into<MountRequest> ) -> Result<MountOutcome, MountError> {
		self.mount_reporting( &request.into(), false )
	}

	/// Halts and removes the instance registered under `type_id`.
	///
	/// Failures of `halt` and of the host's menu removal are reported but do not stop
	/// the unmount.
	///
	/// # Errors
	/// [`MountError::NotMounted`] if no such instance is registered.
	pub fn unmount( &self, type_id: &str ) -> Result<(), MountError> {
		let mut session = self.lock_session();
		let result = self.unmount_locked( &mut session, type_id );
		if let Err( err ) = &result { self.report_failure( &format!( "Failed to unmount '{}': {}", type_id, err )); }
		result
	}

	/// Unmounts every registered instance in registration order.
	pub fn unmount_all( &self ) -> PartialSuccess<Vec<String>, MountError> {
		self.registry.type_ids().into_iter()
			.map(| type_id | self.unmount( &type_id ).map(|()| type_id ))
			.partition_result()
	}

	/// Snapshot of the requested source paths, oldest first.
	pub fn history( &self ) -> Vec<PathBuf> {
		self.lock_session().history.paths().to_vec()
	}

	/// Snapshot of the registered types and their states.
	pub fn mounted( &self ) -> Vec<( String, PluginState )> {
		self.registry.records().into_iter()
			.map(| record | ( record.type_id().to_string(), record.state() ))
			.collect()
	}

	fn mount_reporting( &self, request: &MountRequest, announce: bool ) -> Result<MountOutcome, MountError> {
		let result = self.try_mount( request, announce );
		if let Err( err ) = &result {
			self.report_failure( &format!( "Failed to mount {}: {}", request.source().display(), err ));
		}
		result
	}

	fn try_mount( &self, request: &MountRequest, announce: bool ) -> Result<MountOutcome, MountError> {

		let source = self.config.resolve_source( request.source() );
		let mut session = self.lock_session();

		let previous = match session.history.contains( &source ) {
			true => session.sources.get( &source ).cloned(),
			false => None,
		};
		if let Some( type_id ) = previous {
			info!( target: "wasm_mount::orchestrator", path = %source.display(), type_id = %type_id, "source requested again, unloading previous instance" );
			match self.unmount_locked( &mut session, &type_id ) {
				Ok(()) | Err( MountError::NotMounted( _ )) => {},
				Err( err ) => return Err( err ),
			}
		}
		session.history.push( &source )?;

		let ( origin, unit ) = self.select_origin( &source, request.unit() )?;
		let loader = UnitLoader::new( &self.engine, origin, self.naming.clone() );
		let descriptor = loader.load( &unit )?;
		let type_id = descriptor.name().to_string();

		let ( instance, created ) = self.registry.get_or_create( &type_id, || self.construct( descriptor ))?;
		if !created {
			debug!( target: "wasm_mount::orchestrator", path = %source.display(), type_id = %type_id, "type already registered" );
			return Ok( MountOutcome::AlreadyMounted( type_id ));
		}
		session.sources.insert( source.clone(), type_id.clone() );

		let Some( host ) = &self.host else {
			info!( target: "wasm_mount::orchestrator", path = %source.display(), type_id = %type_id, "unit loaded without host" );
			return Ok( MountOutcome::Loaded( type_id ));
		};

		if let Err( err ) = host.insert_into_menu( &instance.menu_handle() ) {
			warn!( target: "wasm_mount::orchestrator", type_id = %type_id, error = %err, "host rejected unit, rolling back" );
			if let Err( err ) = instance.halt() {
				warn!( target: "wasm_mount::orchestrator", type_id = %type_id, error = %err, "halt failed during rollback" );
			}
			self.registry.remove( &type_id );
			session.sources.remove( &source );
			return Err( MountError::HostCallbackFailed( type_id, err ));
		}

		self.registry.set_state( &type_id, PluginState::Mounted );
		info!( target: "wasm_mount::orchestrator", path = %source.display(), type_id = %type_id, name = instance.display_name(), "unit mounted" );
		if announce { host.report( &format!( "Mounted {} ({})", instance.display_name(), type_id )); }
		Ok( MountOutcome::Mounted( type_id ))

	}

	fn unmount_locked( &self, session: &mut Session, type_id: &str ) -> Result<(), MountError> {

		let instance = self.registry.get( type_id ).ok_or_else(|| MountError::NotMounted( type_id.to_string() ))?;
		let was_mounted = self.registry.state( type_id ) == Some( PluginState::Mounted );

		if let Err( err ) = instance.halt() {
			warn!( target: "wasm_mount::orchestrator", type_id, error = %err, "halt failed" );
			self.report_failure( &format!( "'{}' failed to halt: {}", type_id, err ));
		}
		if let Some( host ) = self.host.as_ref().filter(|_| was_mounted ) {
			if let Err( err ) = host.remove_from_menu( &instance.menu_handle() ) {
				warn!( target: "wasm_mount::orchestrator", type_id, error = %err, "host failed to remove unit" );
				self.report_failure( &format!( "Failed to remove '{}' from the menu: {}", type_id, err ));
			}
		}

		self.registry.set_state( type_id, PluginState::Unmounted );
		session.sources.retain(|_, known | known.as_str() != type_id );
		if !self.registry.remove( type_id ) { return Err( MountError::NotMounted( type_id.to_string() )) }

		info!( target: "wasm_mount::orchestrator", type_id, "unit unmounted" );
		Ok(())

	}

	/// Picks the origin for `source` and the unit to load from it.
	fn select_origin( &self, source: &Path, unit: Option<&str> ) -> Result<( Origin, String ), MountError> {

		if self.naming.is_archive( source ) {
			let unit = match unit {
				Some( unit ) => unit.to_string(),
				None => file_stem( source )?,
			};
			let origin = ArchiveOrigin::open( source, self.naming.clone(), self.config.archive_subdir.as_str() )?;
			return Ok(( Origin::Archive( origin ), unit ));
		}

		if source.is_dir() {
			let unit = unit.ok_or_else(|| MountError::NotFound( format!( "no unit named for directory {}", source.display() )))?;
			return Ok(( Origin::Directory( DirectoryOrigin::new( source, self.naming.clone() )), unit.to_string() ));
		}

		let base = source.parent().unwrap_or( Path::new( "." ));
		let unit = match unit {
			Some( unit ) => unit.to_string(),
			None => file_stem( source )?,
		};
		Ok(( Origin::Directory( DirectoryOrigin::new( base, self.naming.clone() )), unit ))

	}

	/// Instantiates a unit and runs its `init`. Runs under the registry lock.
	fn construct( &self, descriptor: Arc<UnitDescriptor> ) -> Result<PluginInstance, MountError> {
		let unit = descriptor.name().to_string();
		let linker = Linker::new( &self.engine );
		let instance = Plugin::new( descriptor )
			.instantiate( &self.engine, &linker, &self.config.lifecycle_interface )
			.map_err(| err | MountError::instantiate( &unit, err ))?;
		instance.init().map_err(| err | MountError::call( &unit, err ))?;
		Ok( instance )
	}

	fn report_failure( &self, message: &str ) {
		warn!( target: "wasm_mount::orchestrator", "{}", message );
		if let Some( host ) = &self.host { host.report( message ); }
	}

	// Session state is only changed by single pushes and map operations, which leave
	// it consistent if a host callback panics mid-request.
	fn lock_session( &self ) -> MutexGuard<'_, Session> {
		self.session.lock().unwrap_or_else( PoisonError::into_inner )
	}

}

impl std::fmt::Debug for Orchestrator {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Orchestrator" )
			.field( "config", &self.config )
			.field( "registry", &self.registry )
			.field( "host", &self.host.as_ref().map(|_| "<Host>" ))
			.finish_non_exhaustive()
	}
}

fn file_stem( path: &Path ) -> Result<String, MountError> {
	path.file_stem()
		.and_then(| stem | stem.to_str() )
		.map( str::to_string )
		.ok_or_else(|| MountError::NotFound( format!( "no unit name in {}", path.display() )))
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn history_does_not_repeat_paths() {
		let mut history = PathHistory::new( 2 );
		assert!( history.push( Path::new( "a.zip" )).unwrap() );
		assert!( !history.push( Path::new( "a.zip" )).unwrap() );
		assert!( history.push( Path::new( "b.zip" )).unwrap() );
		assert_eq!( history.len(), 2 );
	}

	#[test]
	fn full_history_rejects_new_paths() {
		let mut history = PathHistory::new( 1 );
		history.push( Path::new( "a.zip" )).unwrap();
		assert_eq!(
			history.push( Path::new( "b.zip" )).unwrap_err(),
			CapacityExceeded { bound: Bound::PathHistory, capacity: 1 },
		);
		assert!( !history.push( Path::new( "a.zip" )).unwrap() );
	}

	#[test]
	fn request_conversions() {
		let request = MountRequest::from( "tools.zip" ).with_unit( "acme.Counter" );
		assert_eq!( request.source(), Path::new( "tools.zip" ));
		assert_eq!( request.unit(), Some( "acme.Counter" ));
		assert_eq!( MountOutcome::Loaded( "X".to_string() ).type_id(), "X" );
	}

}
