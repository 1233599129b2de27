//! Storage backends that resolve unit names to binary payloads.
//!
//! An origin is either a directory of loose unit files ([`DirectoryOrigin`]) or an
//! opened archive ([`ArchiveOrigin`]). Both sit behind the [`Resolver`] trait and are
//! combined in the closed [`Origin`] enum, which is selected once per load request.

use std::io ;
use std::path::{ Path, PathBuf, MAIN_SEPARATOR };
use std::sync::Arc ;
use itertools::Itertools ;
use thiserror::Error ;
use tracing::debug ;
use walkdir::WalkDir ;

use crate::archive::{ ArchiveIndex, ArchiveError };
use crate::naming::{ UnitNaming, ARCHIVE_SEPARATOR };
use crate::utils::PartialSuccess ;



/// Errors produced while resolving a unit name to its payload.
#[derive( Error, Debug )]
pub enum ResolveError {
	/// The origin holds no payload for the unit.
	#[error( "Unit '{0}' not found in {1}" )] NotFound( String, OriginDescription ),
	/// The payload exists but could not be read.
	#[error( "Failed to read '{0}': {1}" )] Io( String, #[source] io::Error ),
}

/// Where a payload came from.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub enum OriginDescription {
	/// A directory of loose unit files.
	Directory( PathBuf ),
	/// A zip archive.
	Archive( PathBuf ),
}

impl std::fmt::Display for OriginDescription {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Directory( path ) => write!( f, "directory {}", path.display() ),
			Self::Archive( path ) => write!( f, "archive {}", path.display() ),
		}
	}
}

/// Resolves a unit name to the raw bytes of its payload.
pub trait Resolver {

	/// Produces the payload of `unit`.
	///
	/// # Errors
	/// [`ResolveError::NotFound`] if the origin has no such unit, [`ResolveError::Io`]
	/// if the payload exists but is unreadable.
	fn resolve( &self, unit: &str ) -> Result<Arc<[u8]>, ResolveError> ;

	/// Describes the origin for diagnostics and unit descriptors.
	fn describe( &self ) -> OriginDescription ;

}

/// A directory in which each unit is one file, `<base>/<namespace path>/<Name>.<ext>`.
#[derive( Debug, Clone )]
pub struct DirectoryOrigin {
	base: PathBuf,
	naming: UnitNaming,
}

impl DirectoryOrigin {

	pub fn new( base: impl Into<PathBuf>, naming: UnitNaming ) -> Self {
		Self { base: base.into(), naming }
	}

	#[inline] pub fn base( &self ) -> &Path { &self.base }

	/// Path at which `unit` is expected, or `None` if the name is not valid.
	pub fn unit_path( &self, unit: &str ) -> Option<PathBuf> {
		let qualified = self.naming.qualified_name( unit )?;
		Some( self.base.join( self.naming.storage_path( &qualified, MAIN_SEPARATOR )))
	}

	/// Lists the qualified names of every unit file below the base directory.
	///
	/// Entries that cannot be read are returned as errors next to the names found.
	pub fn discover( &self ) -> PartialSuccess<Vec<String>, ResolveError> {
		let ( paths, errors ) = WalkDir::new( &self.base )
			.follow_links( false )
			.into_iter()
			.map(| entry | entry.map_err(| err | ResolveError::Io(
				err.path().unwrap_or( &self.base ).display().to_string(),
				io::Error::from( err ),
			)))
			.partition_result::<Vec<_>, Vec<_>, _, _>();
		let names = paths.into_iter()
			.filter(| entry | entry.file_type().is_file() )
			.filter_map(| entry | {
				let relative = entry.path().strip_prefix( &self.base ).ok()?;
				let relative = relative.components()
					.map(| component | component.as_os_str().to_string_lossy() )
					.join( &ARCHIVE_SEPARATOR.to_string() );
				self.naming.from_storage_path( &relative )
			})
			.sorted()
			.dedup()
			.collect();
		( names, errors )
	}

}

impl Resolver for DirectoryOrigin {

	fn resolve( &self, unit: &str ) -> Result<Arc<[u8]>, ResolveError> {
		let path = self.unit_path( unit )
			.ok_or_else(|| ResolveError::NotFound( unit.to_string(), self.describe() ))?;
		match std::fs::read( &path ) {
			Ok( bytes ) => {
				debug!( target: "wasm_mount::origin", unit, path = %path.display(), size = bytes.len(), "unit resolved" );
				Ok( bytes.into() )
			},
			Err( err ) if err.kind() == io::ErrorKind::NotFound => Err( ResolveError::NotFound( unit.to_string(), self.describe() )),
			Err( err ) => Err( ResolveError::Io( path.display().to_string(), err )),
		}
	}

	fn describe( &self ) -> OriginDescription { OriginDescription::Directory( self.base.clone() ) }

}

/// An opened zip archive whose unit entries are usually grouped under a
/// conventional subdirectory.
#[derive( Debug, Clone )]
pub struct ArchiveOrigin {
	path: PathBuf,
	index: Arc<ArchiveIndex>,
	naming: UnitNaming,
	subdir: String,
}

impl ArchiveOrigin {

	/// Opens and indexes the archive at `path`.
	///
	/// # Errors
	/// Propagates any [`ArchiveError`] from reading the archive.
	pub fn open( path: impl Into<PathBuf>, naming: UnitNaming, subdir: impl Into<String> ) -> Result<Self, ArchiveError> {
		let path = path.into();
		let index = ArchiveIndex::open( &path )?;
		Ok( Self::from_index( path, Arc::new( index ), naming, subdir ))
	}

	/// Wraps an already built index.
	pub fn from_index( path: impl Into<PathBuf>, index: Arc<ArchiveIndex>, naming: UnitNaming, subdir: impl Into<String> ) -> Self {
		let subdir = subdir.into().trim_matches( ARCHIVE_SEPARATOR ).to_string();
		Self { path: path.into(), index, naming, subdir }
	}

	#[inline] pub fn path( &self ) -> &Path { &self.path }
	#[inline] pub fn index( &self ) -> &ArchiveIndex { &self.index }

	/// Lists the qualified names of every unit entry, with the conventional
	/// subdirectory prefix removed.
	pub fn discover( &self ) -> Vec<String> {
		let prefix = format!( "{}{}", self.subdir, ARCHIVE_SEPARATOR );
		self.index.paths()
			.map(| path | match self.subdir.is_empty() {
				true => path,
				false => path.strip_prefix( prefix.as_str() ).unwrap_or( path ),
			})
			.filter_map(| relative | self.naming.from_storage_path( relative ))
			.sorted()
			.dedup()
			.collect()
	}

}

impl Resolver for ArchiveOrigin {

	/// Tries `<subdir>/<path>` first, then `<path>` by exact path or bare file name.
	fn resolve( &self, unit: &str ) -> Result<Arc<[u8]>, ResolveError> {
		let qualified = self.naming.qualified_name( unit )
			.ok_or_else(|| ResolveError::NotFound( unit.to_string(), self.describe() ))?;
		let relative = self.naming.storage_path( &qualified, ARCHIVE_SEPARATOR );

		let in_subdir = match self.subdir.is_empty() {
			true => None,
			false => self.index.get_shared( &format!( "{}{}{}", self.subdir, ARCHIVE_SEPARATOR, relative )),
		};
		let payload = in_subdir
			.or_else(|| self.index.lookup_shared( &relative ))
			.ok_or_else(|| ResolveError::NotFound( unit.to_string(), self.describe() ))?;

		debug!( target: "wasm_mount::origin", unit, archive = %self.path.display(), size = payload.len(), "unit resolved" );
		Ok( Arc::clone( payload ))
	}

	fn describe( &self ) -> OriginDescription { OriginDescription::Archive( self.path.clone() ) }

}

/// The closed set of origins a load request can be served from.
#[derive( Debug, Clone )]
pub enum Origin {
	Directory( DirectoryOrigin ),
	Archive( ArchiveOrigin ),
}

impl Origin {

	/// Opens the origin at `path`: an archive if it carries the archive extension,
	/// a directory of loose units otherwise.
	///
	/// # Errors
	/// Propagates archive failures; directory origins are not touched until resolution.
	pub fn open( path: impl Into<PathBuf>, naming: UnitNaming, archive_subdir: &str ) -> Result<Self, ArchiveError> {
		let path = path.into();
		Ok( match naming.is_archive( &path ) {
			true => Self::Archive( ArchiveOrigin::open( path, naming, archive_subdir )? ),
			false => Self::Directory( DirectoryOrigin::new( path, naming )),
		})
	}

	/// Lists the units this origin offers.
	pub fn discover( &self ) -> PartialSuccess<Vec<String>, ResolveError> {
		match self {
			Self::Directory( origin ) => origin.discover(),
			Self::Archive( origin ) => ( origin.discover(), Vec::new() ),
		}
	}

}

impl Resolver for Origin {

	fn resolve( &self, unit: &str ) -> Result<Arc<[u8]>, ResolveError> {
		match self {
			Self::Directory( origin ) => origin.resolve( unit ),
			Self::Archive( origin ) => origin.resolve( unit ),
		}
	}

	fn describe( &self ) -> OriginDescription {
		match self {
			Self::Directory( origin ) => origin.describe(),
			Self::Archive( origin ) => origin.describe(),
		}
	}

}
