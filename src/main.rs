use std::path::PathBuf ;
use std::process::ExitCode ;
use clap::Parser ;
use tracing_subscriber::EnvFilter ;
use wasm_mount::{ Host, HostError, MenuHandle, MountConfig, MountOutcome, Orchestrator };



/// Mounts WebAssembly plugin units and lists what got registered
#[derive( Parser, Debug )]
#[command( author, version, about, long_about = None )]
struct Args {
	/// TOML configuration file
	#[arg( short, long )]
	config: Option<PathBuf>,

	/// Directory relative sources are resolved against
	#[arg( short, long )]
	search_dir: Option<PathBuf>,

	/// Archives (`*.zip`) or unit files (`*.wasm`) to mount
	#[arg( required = true )]
	sources: Vec<PathBuf>,
}

/// Prints menu changes and messages to the terminal.
struct ConsoleHost ;

impl Host for ConsoleHost {

	fn insert_into_menu( &self, handle: &MenuHandle ) -> Result<(), HostError> {
		println!( "+ [{}] {} ({})", handle.id(), handle.label(), handle.type_id() );
		Ok(())
	}

	fn remove_from_menu( &self, handle: &MenuHandle ) -> Result<(), HostError> {
		println!( "- [{}] {} ({})", handle.id(), handle.label(), handle.type_id() );
		Ok(())
	}

	fn report( &self, message: &str ) { eprintln!( "{}", message ) }

}

fn main() -> ExitCode {

	tracing_subscriber::fmt()
		.with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new( "info" )))
		.with_writer( std::io::stderr )
		.init();

	match run( Args::parse() ) {
		Ok( true ) => ExitCode::SUCCESS,
		Ok( false ) => ExitCode::FAILURE,
		Err( e ) => {
			eprintln!( "{}", e );
			ExitCode::FAILURE
		},
	}

}

/// Returns `Ok( false )` if any source failed to mount.
fn run( args: Args ) -> Result<bool, Box<dyn std::error::Error>> {

	let mut config = match &args.config {
		Some( path ) => MountConfig::from_file( path )?,
		None => MountConfig::default(),
	};
	if let Some( search_dir ) = args.search_dir { config = config.with_search_dir( search_dir ); }

	let orchestrator = Orchestrator::from_config( config )?.with_host( std::sync::Arc::new( ConsoleHost ));

	let failures = args.sources.iter()
		.filter(| source | match orchestrator.mount( source.as_path() ) {
			Ok( MountOutcome::AlreadyMounted( type_id )) => {
				eprintln!( "{} is already mounted", type_id );
				false
			},
			Ok( _ ) => false,
			Err( _ ) => true,
		})
		.count();

	for instance in orchestrator.registry().list() {
		println!( "{}\t{}\t{}", instance.type_id(), instance.source_file_name(), instance.description() );
	}

	let ( _, unmount_failures ) = orchestrator.unmount_all();
	Ok( failures == 0 && unmount_failures.is_empty() )

}
