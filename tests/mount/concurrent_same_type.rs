use std::sync::Arc ;
use wasm_mount::{ MountOutcome, MountRequest };
use crate::mount_setup::{ orchestrator, write_unit_archive };
use crate::recording_host::RecordingHost ;
use crate::unit_fixtures::UnitFixture ;

#[test]
fn concurrent_mounts_of_one_type() {

	let dir = tempfile::tempdir().unwrap();
	write_unit_archive( dir.path(), "first.zip", "Shared", &UnitFixture::new( "Shared" ));
	write_unit_archive( dir.path(), "second.zip", "Shared", &UnitFixture::new( "Shared" ));
	let host = Arc::new( RecordingHost::new() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, Some( &host ));
	let orchestrator = Arc::new( orchestrator );

	let outcomes = [ "first.zip", "second.zip" ].into_iter()
		.map(| source | {
			let orchestrator = Arc::clone( &orchestrator );
			std::thread::spawn( move || orchestrator.mount( MountRequest::new( source ).with_unit( "Shared" )))
		})
		.collect::<Vec<_>>()
		.into_iter()
		.map(| handle | handle.join().expect( "Mount thread panicked" ).expect( "Mount failed" ))
		.collect::<Vec<_>>();

	let mounted = outcomes.iter().filter(| outcome | matches!( outcome, MountOutcome::Mounted( _ ))).count();
	let already = outcomes.iter().filter(| outcome | matches!( outcome, MountOutcome::AlreadyMounted( _ ))).count();
	assert_eq!(( mounted, already ), ( 1, 1 ), "Unexpected outcomes: {:?}", outcomes );
	assert!( outcomes.iter().all(| outcome | outcome.type_id() == "Shared" ));

	assert_eq!( registry.count(), 1 );
	assert_eq!( host.inserted().len(), 1 );

}
