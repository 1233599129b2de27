use std::sync::Arc ;
use wasm_mount::{ ArchiveIndex, ArchiveOrigin, DirectoryOrigin, Origin, UnitNaming };
use crate::unit_fixtures::write_file ;
use crate::zip_writer::ZipWriter ;

#[test]
fn directory_discovery_lists_qualified_names() {

	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "Foo.wasm", "" );
	write_file( dir.path(), "acme/Bar.wasm", "" );
	write_file( dir.path(), "acme/notes.txt", "" );

	let origin = Origin::Directory( DirectoryOrigin::new( dir.path(), UnitNaming::default() ));
	let ( names, errors ) = origin.discover();

	assert!( errors.is_empty(), "Produced errors: {:?}", errors );
	assert_eq!( names, vec![ "Foo".to_string(), "acme.Bar".to_string() ]);

}

#[test]
fn archive_discovery_strips_subdirectory() {

	let index = ArchiveIndex::from_bytes( &ZipWriter::new()
		.file( "plugins/Foo.wasm", "a" )
		.file( "plugins/acme/Bar.wasm", "b" )
		.file( "Baz.wasm", "c" )
		.file( "Readme.txt", "d" )
		.finish()
	).unwrap();
	let origin = Origin::Archive( ArchiveOrigin::from_index( "units.zip", Arc::new( index ), UnitNaming::default(), "plugins" ));

	let ( names, errors ) = origin.discover();
	assert!( errors.is_empty() );
	assert_eq!( names, vec![ "Baz".to_string(), "Foo".to_string(), "acme.Bar".to_string() ]);

}
