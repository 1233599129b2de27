use wasm_mount::{ DirectoryLoader, DirectoryOrigin, Engine, LoadError, UnitNaming };
use crate::unit_fixtures::{ write_file, UnitFixture };

#[test]
fn malformed_payload_is_not_cached() {

	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "Broken.wasm", b"\0asm\x0d\0\x01\0garbage" );

	let engine = Engine::default();
	let loader = DirectoryLoader::new( &engine, DirectoryOrigin::new( dir.path(), UnitNaming::default() ), UnitNaming::default() );

	match loader.load( "Broken" ) {
		Err( LoadError::MalformedPayload( name, _ )) => assert_eq!( name, "Broken" ),
		value => panic!( "Expected MalformedPayload, found: {:#?}", value ),
	}
	assert!( !loader.is_defined( "Broken" ));

	// Fixing the payload on disk is picked up because nothing was cached.
	write_file( dir.path(), "Broken.wasm", UnitFixture::new( "Broken" ).wat() );
	assert!( loader.load( "Broken" ).expect( "Failed to load repaired unit" ).is_defined() );

}

#[test]
fn missing_unit_is_a_resolve_error() {
	let dir = tempfile::tempdir().unwrap();
	let engine = Engine::default();
	let loader = DirectoryLoader::new( &engine, DirectoryOrigin::new( dir.path(), UnitNaming::default() ), UnitNaming::default() );
	assert!( matches!( loader.load( "Absent" ), Err( LoadError::Resolve( _ ))));
	assert!( matches!( loader.load( "a..b" ), Err( LoadError::InvalidName( _ ))));
}
