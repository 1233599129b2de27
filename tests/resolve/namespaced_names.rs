use std::sync::Arc ;
use wasm_mount::{ ArchiveIndex, ArchiveOrigin, DirectoryOrigin, Resolver, UnitNaming };
use crate::unit_fixtures::write_file ;
use crate::zip_writer::ZipWriter ;

#[test]
fn directory_maps_namespaces_to_subdirectories() {
	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "acme/tools/Counter.wasm", "counter" );
	let origin = DirectoryOrigin::new( dir.path(), UnitNaming::default() );
	assert_eq!( &*origin.resolve( "acme.tools.Counter" ).unwrap(), b"counter" );
}

#[test]
fn archive_maps_namespaces_to_entry_paths() {
	let index = ArchiveIndex::from_bytes( &ZipWriter::new().file( "plugins/acme/tools/Counter.wasm", "counter" ).finish() ).unwrap();
	let origin = ArchiveOrigin::from_index( "units.zip", Arc::new( index ), UnitNaming::default(), "plugins" );
	assert_eq!( &*origin.resolve( "acme.tools.Counter" ).unwrap(), b"counter" );
}

#[test]
fn separator_replacement_flattens_namespaces() {
	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "acme_tools_Counter.wasm", "flat" );
	let naming = UnitNaming::default().with_separator_replacement( Some( '_' ));
	let origin = DirectoryOrigin::new( dir.path(), naming );
	assert_eq!( &*origin.resolve( "acme.tools.Counter" ).unwrap(), b"flat" );
}
