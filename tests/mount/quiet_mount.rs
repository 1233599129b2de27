use std::sync::Arc ;
use wasm_mount::{ ErrorKind, MountOutcome };
use crate::mount_setup::{ orchestrator, write_unit_archive };
use crate::recording_host::RecordingHost ;
use crate::unit_fixtures::UnitFixture ;

#[test]
fn quiet_mount_reports_failures_only() {

	let dir = tempfile::tempdir().unwrap();
	write_unit_archive( dir.path(), "Counter.zip", "Counter", &UnitFixture::new( "Counter" ));
	let host = Arc::new( RecordingHost::new() );
	let ( orchestrator, _ ) = orchestrator( dir.path(), 4, Some( &host ));

	assert_eq!( orchestrator.mount_quietly( "Counter.zip" ).unwrap(), MountOutcome::Mounted( "Counter".to_string() ));
	assert_eq!( host.inserted().len(), 1 );
	assert!( host.messages().is_empty(), "Unexpected messages: {:?}", host.messages() );

	let err = orchestrator.mount_quietly( "Missing.zip" ).unwrap_err();
	assert_eq!( err.kind(), ErrorKind::NotFound );
	assert_eq!( host.messages().len(), 1 );

}

#[test]
fn loud_mount_announces_success() {

	let dir = tempfile::tempdir().unwrap();
	write_unit_archive( dir.path(), "Counter.zip", "Counter", &UnitFixture::new( "Counter" ));
	let host = Arc::new( RecordingHost::new() );
	let ( orchestrator, _ ) = orchestrator( dir.path(), 4, Some( &host ));

	orchestrator.mount( "Counter.zip" ).unwrap();
	assert_eq!( host.messages(), vec![ "Mounted Counter (Counter)".to_string() ]);

}
