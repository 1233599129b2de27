use wasm_mount::{ ErrorKind, MountOutcome, MountRequest };
use crate::mount_setup::orchestrator ;
use crate::unit_fixtures::{ write_file, UnitFixture };

#[test]
fn directory_source_needs_unit_name() {

	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "units/acme/Counter.wasm", UnitFixture::new( "Counter" ).wat() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, None );

	assert_eq!( orchestrator.mount( "units" ).unwrap_err().kind(), ErrorKind::NotFound );

	let outcome = orchestrator.mount( MountRequest::new( "units" ).with_unit( "acme.Counter" )).unwrap();
	assert_eq!( outcome, MountOutcome::Loaded( "acme.Counter".to_string() ));
	assert!( registry.contains( "acme.Counter" ));

}

#[test]
fn absolute_loose_file_source() {

	let dir = tempfile::tempdir().unwrap();
	let elsewhere = tempfile::tempdir().unwrap();
	write_file( elsewhere.path(), "Loose.wasm", UnitFixture::new( "Loose" ).wat() );
	let ( orchestrator, _ ) = orchestrator( dir.path(), 4, None );

	let outcome = orchestrator.mount( elsewhere.path().join( "Loose.wasm" )).unwrap();
	assert_eq!( outcome.type_id(), "Loose" );
	assert_eq!( orchestrator.history(), vec![ elsewhere.path().join( "Loose.wasm" )]);

}
