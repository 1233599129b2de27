use std::sync::Arc ;
use wasm_mount::{ ErrorKind, MountError };
use crate::mount_setup::{ orchestrator, write_unit_archive };
use crate::recording_host::RecordingHost ;
use crate::unit_fixtures::UnitFixture ;

#[test]
fn host_rejects_mount() {

	let dir = tempfile::tempdir().unwrap();
	write_unit_archive( dir.path(), "A.zip", "A", &UnitFixture::new( "A" ));
	let host = Arc::new( RecordingHost::rejecting_inserts() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, Some( &host ));

	let err = match orchestrator.mount( "A.zip" ) {
		Err( err @ MountError::HostCallbackFailed( .. )) => err,
		value => panic!( "Expected HostCallbackFailed, found: {:#?}", value ),
	};
	assert_eq!( err.kind(), ErrorKind::HostCallbackFailed );
	assert!( !registry.contains( "A" ));
	assert_eq!( registry.count(), 0 );
	assert!( host.messages().iter().any(| message | message.contains( "A.zip" )));

	// The rolled back source can be requested again.
	assert!( matches!( orchestrator.mount( "A.zip" ), Err( MountError::HostCallbackFailed( .. ))));
	assert_eq!( registry.count(), 0 );

}

#[test]
fn host_rejects_mount_and_halt_traps() {

	let dir = tempfile::tempdir().unwrap();
	write_unit_archive( dir.path(), "B.zip", "B", &UnitFixture::new( "B" ).trapping_halt() );
	let host = Arc::new( RecordingHost::rejecting_inserts() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, Some( &host ));

	match orchestrator.mount( "B.zip" ) {
		Err( MountError::HostCallbackFailed( type_id, _ )) => assert_eq!( type_id, "B" ),
		value => panic!( "Expected HostCallbackFailed, found: {:#?}", value ),
	}
	assert_eq!( registry.count(), 0 );
	assert!( host.removed().is_empty() );

	match orchestrator.mount( "B.zip" ) {
		Err( MountError::HostCallbackFailed( type_id, _ )) => assert_eq!( type_id, "B" ),
		value => panic!( "Expected HostCallbackFailed on retry, found: {:#?}", value ),
	}
	assert_eq!( registry.count(), 0 );

}
