//! Discover, load, mount and unmount WebAssembly plugin units at run time.
//!
//! A **unit** is a WebAssembly component exporting the lifecycle interface described
//! in [`capability`]. Units are sourced either from a directory of loose `.wasm`
//! files or from a zip archive, compiled once per loader, instantiated without
//! imports and kept in a capacity-bounded [`Registry`] that holds at most one live
//! instance per unit type.
//!
//! # Core Concepts
//!
//! - [`ArchiveIndex`]: The entries of a zip archive, read fully into memory and
//! 	addressable by path or by bare file name.
//!
//! - [`Origin`]: Where payloads come from, a [`DirectoryOrigin`] or an [`ArchiveOrigin`],
//! 	both behind the [`Resolver`] trait.
//!
//! - [`UnitLoader`]: Compiles each unit name it is asked for exactly once and hands out
//! 	[`UnitDescriptor`]s.
//!
//! - [`Plugin`] / [`PluginInstance`]: A defined unit and its live, contract-checked instance.
//!
//! - [`Registry`]: Keyed by type identifier (the unit's qualified name), bounded by a capacity.
//!
//! - [`Orchestrator`]: The mount/unmount state machine tying the above to a [`Host`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc ;
//! use wasm_mount::{ MountConfig, MountRequest, Orchestrator, Registry };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MountConfig::default().with_search_dir( "/opt/app/plugins" );
//! let registry = Arc::new( Registry::new( config.registry_capacity ));
//! let orchestrator = Orchestrator::new( config, Arc::clone( &registry ))?;
//!
//! // Mounts `plugins/Counter.wasm` (or `Counter.wasm`) from the archive.
//! orchestrator.mount( MountRequest::new( "tools.zip" ).with_unit( "Counter" ))?;
//! assert_eq!( registry.count(), 1 );
//!
//! orchestrator.unmount( "Counter" )?;
//! # Ok(())
//! # }
//! ```

mod archive ;
pub mod capability ;
mod config ;
mod error ;
mod host ;
mod loader ;
mod naming ;
mod orchestrator ;
mod origin ;
mod plugin ;
mod plugin_instance ;
mod registry ;
mod utils ;

pub use archive::{ ArchiveError, ArchiveIndex };
pub use capability::{ CapabilityError, LifecycleFunction, ReturnKind, DEFAULT_LIFECYCLE_INTERFACE };
pub use config::{ ConfigError, MountConfig };
pub use error::{ ErrorKind, MountError };
pub use host::{ Host, HostError, MenuHandle };
pub use loader::{ ArchiveLoader, DirectoryLoader, LoadError, UnitDescriptor, UnitLoader };
pub use naming::{ UnitNaming, ARCHIVE_SEPARATOR };
pub use orchestrator::{ MountOutcome, MountRequest, Orchestrator, PathHistory };
pub use origin::{ ArchiveOrigin, DirectoryOrigin, Origin, OriginDescription, ResolveError, Resolver };
pub use plugin::{ InstantiateError, Plugin, UnitContext };
pub use plugin_instance::{ CallError, PluginInstance };
pub use registry::{ Bound, CapacityExceeded, PluginRecord, PluginState, Registry };
pub use utils::PartialSuccess ;

pub use wasmtime::Engine ;
