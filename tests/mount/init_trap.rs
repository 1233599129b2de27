use std::sync::Arc ;
use wasm_mount::{ ErrorKind, MountError };
use crate::mount_setup::{ orchestrator, write_unit_archive };
use crate::recording_host::RecordingHost ;
use crate::unit_fixtures::UnitFixture ;

#[test]
fn trap_in_init() {

	let dir = tempfile::tempdir().unwrap();
	write_unit_archive( dir.path(), "Faulty.zip", "Faulty", &UnitFixture::new( "Faulty" ).trapping_init() );
	let host = Arc::new( RecordingHost::new() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, Some( &host ));

	let err = match orchestrator.mount( "Faulty.zip" ) {
		Err( err @ MountError::Instantiation( .. )) => err,
		value => panic!( "Expected Instantiation, found: {:#?}", value ),
	};
	assert_eq!( err.kind(), ErrorKind::Instantiation );
	assert!( err.to_string().contains( "init" ));
	assert_eq!( registry.count(), 0 );
	assert!( host.inserted().is_empty() );

}

#[test]
fn trap_in_post_return_cleanup() {

	let dir = tempfile::tempdir().unwrap();
	write_unit_archive( dir.path(), "Leaky.zip", "Leaky", &UnitFixture::new( "Leaky" ).trapping_cleanup() );
	let host = Arc::new( RecordingHost::new() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, Some( &host ));

	let err = match orchestrator.mount( "Leaky.zip" ) {
		Err( err @ MountError::Instantiation( .. )) => err,
		value => panic!( "Expected Instantiation, found: {:#?}", value ),
	};
	assert!( err.to_string().contains( "description" ), "unexpected message: {}", err );
	assert_eq!( registry.count(), 0 );
	assert!( host.inserted().is_empty() );

}
