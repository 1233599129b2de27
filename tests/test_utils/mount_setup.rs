#[allow( dead_code )]
mod mount_setup {

	use std::path::Path ;
	use std::sync::Arc ;
	use wasm_mount::{ MountConfig, Orchestrator, PluginInstance, Registry };
	use crate::recording_host::RecordingHost ;
	use crate::unit_fixtures::UnitFixture ;
	use crate::zip_writer::ZipWriter ;

	/// Writes `root/<archive>` holding `fixture` as `plugins/<unit>.wasm`.
	pub fn write_unit_archive( root: &Path, archive: &str, unit: &str, fixture: &UnitFixture ) {
		ZipWriter::new()
			.file( &format!( "plugins/{}.wasm", unit ), fixture.wat() )
			.write_to( &root.join( archive ));
	}

	/// An orchestrator searching `root`, backed by a registry of `capacity`.
	pub fn orchestrator(
		root: &Path,
		capacity: usize,
		host: Option<&Arc<RecordingHost>>,
	) -> ( Orchestrator, Arc<Registry<PluginInstance>> ) {
		let registry = Arc::new( Registry::new( capacity ));
		let orchestrator = Orchestrator::new( MountConfig::default().with_search_dir( root ), Arc::clone( &registry ))
			.expect( "Failed to create orchestrator" );
		let orchestrator = match host {
			Some( host ) => orchestrator.with_host( Arc::clone( host ) as Arc<dyn wasm_mount::Host> ),
			None => orchestrator,
		};
		( orchestrator, registry )
	}

}
