//! In-memory index of a zip archive's entries.
//!
//! The archive is read once, every non-directory entry is extracted in full, and
//! the resulting [`ArchiveIndex`] is frozen. Lookups afterwards are read-only
//! and can be shared between threads behind an `Arc` without locking.

use std::collections::HashMap ;
use std::fs::File ;
use std::io::{ self, Read };
use std::path::{ Component, Path, PathBuf };
use std::sync::Arc ;
use flate2::read::DeflateDecoder ;
use thiserror::Error ;
use tracing::debug ;

use crate::naming::ARCHIVE_SEPARATOR ;



/// Errors that can occur while opening or parsing an archive.
#[derive( Error, Debug )]
pub enum ArchiveError {
	/// No file exists at the given path.
	#[error( "Archive not found: {}", .0.display() )] NotFound( PathBuf ),
	/// The archive could not be read, or an entry's payload did not match its declared size.
	#[error( "IO error: {0}" )] Io( #[from] io::Error ),
	/// The container is structurally invalid or uses an unsupported feature.
	#[error( "Invalid archive: {0}" )] Format( String ),
}

/// Entry path → payload mapping of a fully extracted archive.
///
/// A secondary mapping keyed by bare file name (the last path segment) points at
/// the same payloads. When two entries share a bare name the later one wins.
/// Empty entries are kept under their full path but never indexed by bare name.
#[derive( Debug, Default )]
pub struct ArchiveIndex {
	entries: HashMap<String, Arc<[u8]>>,
	by_name: HashMap<String, Arc<[u8]>>,
}

impl ArchiveIndex {

	/// Reads and indexes the archive at `path`.
	///
	/// The file handle only lives for the duration of the read.
	///
	/// # Errors
	/// [`ArchiveError::NotFound`] if there is no such file, [`ArchiveError::Io`] on read
	/// failures or size mismatches, [`ArchiveError::Format`] on a malformed container.
	pub fn open( path: impl AsRef<Path> ) -> Result<Self, ArchiveError> {
		let path = path.as_ref();
		let buffer = read_file( path )?;
		let index = Self::from_bytes( &buffer )?;
		debug!(
			target: "wasm_mount::archive",
			path = %path.display(),
			entries = index.len(),
			bytes = index.total_size(),
			"archive indexed"
		);
		Ok( index )
	}

	/// Indexes an archive already held in memory.
	///
	/// # Errors
	/// Same as [`Self::open`], minus [`ArchiveError::NotFound`].
	pub fn from_bytes( data: &[u8] ) -> Result<Self, ArchiveError> {

		let archive = rawzip::ZipArchive::from_slice( data )
			.map_err(| err | ArchiveError::Format( format!( "{:?}", err )))?;

		let mut index = Self::default();
		for entry in archive.entries() {
			let entry = entry.map_err(| err | ArchiveError::Format( format!( "entry error: {:?}", err )))?;
			if entry.is_dir() { continue }

			let path = entry.file_path()
				.try_normalize()
				.map_err(| err | ArchiveError::Format( format!( "entry path error: {:?}", err )))?
				.as_ref()
				.to_string();
			validate_entry_path( &path )?;

			let declared = entry.uncompressed_size_hint();
			let slice_entry = archive.get_entry( entry.wayfinder() )
				.map_err(| err | ArchiveError::Format( format!( "entry data error for {}: {:?}", path, err )))?;
			let payload = extract( entry.compression_method(), slice_entry.data(), declared, &path )?;
			index.insert( path, payload );
		}

		Ok( index )

	}

	/// Looks up an entry by its exact path, falling back to its bare file name.
	pub fn lookup( &self, name: &str ) -> Option<&[u8]> {
		self.lookup_shared( name ).map( AsRef::as_ref )
	}

	/// Looks up an entry by its exact path only.
	pub fn get( &self, path: &str ) -> Option<&[u8]> {
		self.get_shared( path ).map( AsRef::as_ref )
	}

	/// Like [`Self::lookup`], handing out the stored payload itself.
	pub fn lookup_shared( &self, name: &str ) -> Option<&Arc<[u8]>> {
		self.get_shared( name ).or_else(|| self.by_name.get( name ))
	}

	/// Like [`Self::get`], handing out the stored payload itself.
	pub fn get_shared( &self, path: &str ) -> Option<&Arc<[u8]>> {
		self.entries.get( path )
	}

	/// Number of indexed entries.
	#[inline] pub fn len( &self ) -> usize { self.entries.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.entries.is_empty() }

	/// Combined size of all payloads in bytes.
	pub fn total_size( &self ) -> usize {
		self.entries.values().map(| payload | payload.len() ).sum()
	}

	/// All entry paths, in no particular order.
	pub fn paths( &self ) -> impl Iterator<Item = &str> {
		self.entries.keys().map( String::as_str )
	}

	fn insert( &mut self, path: String, payload: Vec<u8> ) {
		let payload: Arc<[u8]> = payload.into();
		if !payload.is_empty() {
			if let Some( name ) = bare_name( &path ) {
				self.by_name.insert( name.to_string(), Arc::clone( &payload ));
			}
		}
		self.entries.insert( path, payload );
	}

}

fn read_file( path: &Path ) -> Result<Vec<u8>, ArchiveError> {
	let mut file = File::open( path ).map_err(| err | match err.kind() {
		io::ErrorKind::NotFound => ArchiveError::NotFound( path.to_path_buf() ),
		_ => ArchiveError::Io( err ),
	})?;
	let mut buffer = Vec::new();
	file.read_to_end( &mut buffer )?;
	Ok( buffer )
}

fn validate_entry_path( path: &str ) -> Result<(), ArchiveError> {
	let escapes = Path::new( path ).components()
		.any(| component | !matches!( component, Component::Normal( _ ) | Component::CurDir ));
	match escapes {
		true => Err( ArchiveError::Format( format!( "unsupported entry path: {}", path ))),
		false => Ok(()),
	}
}

/// Upper bound on the buffer reserved up front for a compressed entry, whose
/// declared size comes from an untrusted header.
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024 ;

/// Decompresses one entry, reading at most one byte past its declared size.
fn extract(
	method: rawzip::CompressionMethod,
	data: &[u8],
	declared: u64,
	path: &str,
) -> Result<Vec<u8>, ArchiveError> {

	let expected = usize::try_from( declared )
		.map_err(|_| ArchiveError::Format( format!( "entry too large: {}", path )))?;
	let limit = declared.saturating_add( 1 );
	let capacity = match method {
		rawzip::CompressionMethod::Store => expected.min( data.len() ),
		_ => expected.min( MAX_PREALLOCATION ),
	};
	let mut payload = Vec::with_capacity( capacity );

	match method {
		rawzip::CompressionMethod::Store => {
			Read::take( data, limit ).read_to_end( &mut payload )?;
		},
		rawzip::CompressionMethod::Deflate => {
			DeflateDecoder::new( data ).take( limit ).read_to_end( &mut payload )?;
		},
		other => return Err( ArchiveError::Format( format!(
			"unsupported compression method {:?} for {}", other, path,
		))),
	}

	match payload.len().cmp( &expected ) {
		std::cmp::Ordering::Equal => Ok( payload ),
		std::cmp::Ordering::Less => Err( ArchiveError::Io( io::Error::new(
			io::ErrorKind::UnexpectedEof,
			format!( "{}: declared {} bytes, read {}", path, expected, payload.len() ),
		))),
		std::cmp::Ordering::Greater => Err( ArchiveError::Io( io::Error::new(
			io::ErrorKind::InvalidData,
			format!( "{}: payload exceeds declared size of {} bytes", path, expected ),
		))),
	}

}

fn bare_name( path: &str ) -> Option<&str> {
	path.rsplit( ARCHIVE_SEPARATOR ).next().filter(| name | !name.is_empty() )
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn bare_name_is_last_segment() {
		assert_eq!( bare_name( "plugins/acme/Foo.wasm" ), Some( "Foo.wasm" ));
		assert_eq!( bare_name( "Foo.wasm" ), Some( "Foo.wasm" ));
		assert_eq!( bare_name( "plugins/" ), None );
	}

	#[test]
	fn entry_paths_may_not_escape() {
		assert!( validate_entry_path( "plugins/Foo.wasm" ).is_ok() );
		assert!( validate_entry_path( "../Foo.wasm" ).is_err() );
		assert!( validate_entry_path( "/etc/Foo.wasm" ).is_err() );
	}

	#[test]
	fn lookup_prefers_exact_path_over_bare_name() {
		let mut index = ArchiveIndex::default();
		index.insert( "plugins/Foo.wasm".to_string(), vec![ 1 ]);
		index.insert( "Foo.wasm".to_string(), vec![ 2, 2 ]);
		index.insert( "other/Foo.wasm".to_string(), vec![ 3, 3, 3 ]);
		assert_eq!( index.lookup( "Foo.wasm" ), Some( &[ 2, 2 ][..] ));
		assert_eq!( index.lookup( "plugins/Foo.wasm" ), Some( &[ 1 ][..] ));
		assert_eq!( index.lookup( "plugins/Bar.wasm" ), None );
		assert_eq!( index.lookup( "Foo" ), None );
	}

	#[test]
	fn shared_lookups_hand_out_the_stored_payload() {
		let mut index = ArchiveIndex::default();
		index.insert( "plugins/Foo.wasm".to_string(), vec![ 1, 2 ]);
		let by_path = index.get_shared( "plugins/Foo.wasm" ).unwrap();
		let by_name = index.lookup_shared( "Foo.wasm" ).unwrap();
		assert!( Arc::ptr_eq( by_path, by_name ));
	}

	#[test]
	fn empty_entries_are_kept_but_not_indexed_by_name() {
		let mut index = ArchiveIndex::default();
		index.insert( "plugins/Empty.wasm".to_string(), Vec::new() );
		assert_eq!( index.get( "plugins/Empty.wasm" ), Some( &[][..] ));
		assert_eq!( index.lookup( "Empty.wasm" ), None );
		assert_eq!( index.len(), 1 );
		assert_eq!( index.total_size(), 0 );
	}

	#[test]
	fn later_entries_win_bare_name_collisions() {
		let mut index = ArchiveIndex::default();
		index.insert( "a/Foo.wasm".to_string(), vec![ 1 ]);
		index.insert( "b/Foo.wasm".to_string(), vec![ 2 ]);
		assert_eq!( index.lookup( "Foo.wasm" ), Some( &[ 2 ][..] ));
	}

	#[test]
	fn missing_archive_is_not_found() {
		match ArchiveIndex::open( "/definitely/not/here.zip" ) {
			Err( ArchiveError::NotFound( path )) => assert_eq!( path, PathBuf::from( "/definitely/not/here.zip" )),
			other => panic!( "Expected NotFound, found: {:?}", other ),
		}
	}

	#[test]
	fn garbage_is_a_format_error() {
		match ArchiveIndex::from_bytes( b"definitely not a zip archive" ) {
			Err( ArchiveError::Format( _ )) => {}
			other => panic!( "Expected Format error, found: {:?}", other ),
		}
	}

}
