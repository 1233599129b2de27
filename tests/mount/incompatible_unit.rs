use std::sync::Arc ;
use wasm_mount::{ CapabilityError, ErrorKind, LifecycleFunction, MountError };
use crate::mount_setup::orchestrator ;
use crate::recording_host::RecordingHost ;
use crate::unit_fixtures::{ write_file, UnitFixture, EMPTY_COMPONENT, IMPORTING_COMPONENT };

#[test]
fn unit_without_lifecycle_interface() {

	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "Empty.wasm", EMPTY_COMPONENT );
	let host = Arc::new( RecordingHost::new() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, Some( &host ));

	match orchestrator.mount( "Empty.wasm" ) {
		Err( MountError::IncompatibleUnit( type_id, CapabilityError::MissingInterface( _ ))) => assert_eq!( type_id, "Empty" ),
		value => panic!( "Expected MissingInterface, found: {:#?}", value ),
	}
	assert_eq!( registry.count(), 0 );
	assert!( host.inserted().is_empty() );
	assert_eq!( host.messages().len(), 1 );

}

#[test]
fn unit_missing_a_lifecycle_function() {

	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "Partial.wasm", UnitFixture::new( "Partial" ).without_menu_handle().wat() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, None );

	match orchestrator.mount( "Partial.wasm" ) {
		Err( MountError::IncompatibleUnit( _, CapabilityError::MissingFunction( LifecycleFunction::MenuHandle ))) => {}
		value => panic!( "Expected MissingFunction, found: {:#?}", value ),
	}
	assert_eq!( registry.count(), 0 );

}

#[test]
fn unit_with_mistyped_lifecycle_function() {

	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "Signed.wasm", UnitFixture::new( "Signed" ).with_signed_menu_handle().wat() );
	let ( orchestrator, registry ) = orchestrator( dir.path(), 4, None );

	let err = match orchestrator.mount( "Signed.wasm" ) {
		Err( MountError::IncompatibleUnit( _, err @ CapabilityError::SignatureMismatch( LifecycleFunction::MenuHandle, _ ))) => err,
		value => panic!( "Expected SignatureMismatch, found: {:#?}", value ),
	};
	assert!( err.to_string().contains( "expected func() -> u32" ), "unexpected message: {}", err );
	assert_eq!( registry.count(), 0 );

}

#[test]
fn unit_with_imports() {

	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "Needy.wasm", IMPORTING_COMPONENT );
	let ( orchestrator, _ ) = orchestrator( dir.path(), 4, None );

	let err = orchestrator.mount( "Needy.wasm" ).expect_err( "Mounted a unit with imports" );
	assert_eq!( err.kind(), ErrorKind::IncompatibleUnit );
	assert!( matches!( err, MountError::IncompatibleUnit( _, CapabilityError::UnexpectedImport( ref name )) if name == "log" ));

}

#[test]
fn malformed_unit() {
	let dir = tempfile::tempdir().unwrap();
	write_file( dir.path(), "Junk.wasm", "(component" );
	let ( orchestrator, _ ) = orchestrator( dir.path(), 4, None );
	assert_eq!( orchestrator.mount( "Junk.wasm" ).unwrap_err().kind(), ErrorKind::MalformedPayload );
}
