use std::sync::Arc ;
use crate::mount_setup::{ orchestrator, write_unit_archive };
use crate::recording_host::RecordingHost ;
use crate::unit_fixtures::UnitFixture ;

#[test]
fn unmount_all_in_registration_order() {

	let dir = tempfile::tempdir().unwrap();
	for unit in [ "B", "A", "C" ] {
		write_unit_archive( dir.path(), &format!( "{}.zip", unit ), unit, &UnitFixture::new( unit ));
	}
	let host = Arc::new( RecordingHost::new() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, Some( &host ));
	for unit in [ "B", "A", "C" ] {
		orchestrator.mount( format!( "{}.zip", unit ).as_str() ).expect( "Failed to mount" );
	}

	let ( unmounted, errors ) = orchestrator.unmount_all();
	assert!( errors.is_empty(), "Produced errors: {:?}", errors );
	assert_eq!( unmounted, vec![ "B".to_string(), "A".to_string(), "C".to_string() ]);
	assert_eq!( registry.count(), 0 );
	assert_eq!(
		host.removed().iter().map(| handle | handle.type_id().to_string() ).collect::<Vec<_>>(),
		vec![ "B", "A", "C" ],
	);

}
