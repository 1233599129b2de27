//! Runtime configuration of the mount orchestrator.
//!
//! A [`MountConfig`] can be built in code with the `with_*` methods or read from a
//! TOML document in which every key is optional:
//!
//! ```toml
//! search_dir = "/opt/app/plugins"
//! registry_capacity = 16
//! archive_subdir = "units"
//! namespace_separator_replacement = "_"
//! ```

use std::path::{ Path, PathBuf };
use pipe_trait::Pipe ;
use serde::Deserialize ;
use thiserror::Error ;

use crate::capability::DEFAULT_LIFECYCLE_INTERFACE ;
use crate::naming::UnitNaming ;



/// Errors produced while reading or validating a configuration.
#[derive( Error, Debug )]
pub enum ConfigError {
	#[error( "Failed to read config file {}: {}", .0.display(), .1 )] Io( PathBuf, #[source] std::io::Error ),
	#[error( "Invalid TOML: {0}" )] Toml( #[from] toml::de::Error ),
	#[error( "'{0}' must be greater than zero" )] ZeroCapacity( &'static str ),
	#[error( "'{0}' must not be empty" )] EmptyValue( &'static str ),
}

/// Settings shared by every mount request of one orchestrator.
#[derive( Debug, Clone, PartialEq, Eq, Deserialize )]
#[serde( default, deny_unknown_fields )]
pub struct MountConfig {
	/// Base directory relative source paths are resolved against.
	pub search_dir: PathBuf,
	/// Maximum number of live plugin instances.
	pub registry_capacity: usize,
	/// Maximum number of distinct source paths remembered.
	pub history_capacity: usize,
	pub unit_extension: String,
	pub archive_extension: String,
	/// Conventional archive subdirectory searched before the archive root.
	pub archive_subdir: String,
	pub namespace_separator: char,
	/// Character namespace separators are stored as, instead of the origin's own separator.
	pub namespace_separator_replacement: Option<char>,
	/// WIT path of the lifecycle interface units must export.
	pub lifecycle_interface: String,
}

impl Default for MountConfig {
	fn default() -> Self {
		Self {
			search_dir: PathBuf::from( "./plugins" ),
			registry_capacity: 100,
			history_capacity: 256,
			unit_extension: "wasm".to_string(),
			archive_extension: "zip".to_string(),
			archive_subdir: "plugins".to_string(),
			namespace_separator: '.',
			namespace_separator_replacement: None,
			lifecycle_interface: DEFAULT_LIFECYCLE_INTERFACE.to_string(),
		}
	}
}

impl MountConfig {

	/// Parses and validates a TOML document.
	///
	/// # Errors
	/// [`ConfigError::Toml`] for syntax or type errors, otherwise any validation failure.
	pub fn from_toml_str( text: &str ) -> Result<Self, ConfigError> {
		toml::from_str::<Self>( text )?.validated()
	}

	/// Reads, parses and validates the TOML file at `path`.
	///
	/// # Errors
	/// [`ConfigError::Io`] if the file cannot be read, otherwise as [`Self::from_toml_str`].
	pub fn from_file( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		std::fs::read_to_string( path )
			.map_err(| err | ConfigError::Io( path.to_path_buf(), err ))?
			.pipe_as_ref( Self::from_toml_str )
	}

	/// Checks the invariants the orchestrator relies on.
	///
	/// # Errors
	/// [`ConfigError::ZeroCapacity`] or [`ConfigError::EmptyValue`] naming the offending key.
	pub fn validate( &self ) -> Result<(), ConfigError> {
		if self.registry_capacity == 0 { return Err( ConfigError::ZeroCapacity( "registry_capacity" )) }
		if self.history_capacity == 0 { return Err( ConfigError::ZeroCapacity( "history_capacity" )) }
		if self.unit_extension.is_empty() { return Err( ConfigError::EmptyValue( "unit_extension" )) }
		if self.archive_extension.is_empty() { return Err( ConfigError::EmptyValue( "archive_extension" )) }
		if self.lifecycle_interface.is_empty() { return Err( ConfigError::EmptyValue( "lifecycle_interface" )) }
		Ok(())
	}

	fn validated( self ) -> Result<Self, ConfigError> {
		self.validate()?;
		Ok( self )
	}

	/// Naming rules derived from the extension and separator settings.
	pub fn naming( &self ) -> UnitNaming {
		UnitNaming::new( &self.unit_extension, &self.archive_extension, self.namespace_separator )
			.with_separator_replacement( self.namespace_separator_replacement )
	}

	/// Resolves `path` against the search directory unless it is absolute.
	pub fn resolve_source( &self, path: &Path ) -> PathBuf {
		match path.is_absolute() {
			true => path.to_path_buf(),
			false => self.search_dir.join( path ),
		}
	}

	pub fn with_search_dir( mut self, search_dir: impl Into<PathBuf> ) -> Self {
		self.search_dir = search_dir.into();
		self
	}

	pub fn with_registry_capacity( mut self, capacity: usize ) -> Self {
		self.registry_capacity = capacity ;
		self
	}

	pub fn with_history_capacity( mut self, capacity: usize ) -> Self {
		self.history_capacity = capacity ;
		self
	}

	pub fn with_extensions( mut self, unit_extension: impl Into<String>, archive_extension: impl Into<String> ) -> Self {
		self.unit_extension = unit_extension.into();
		self.archive_extension = archive_extension.into();
		self
	}

	pub fn with_archive_subdir( mut self, subdir: impl Into<String> ) -> Self {
		self.archive_subdir = subdir.into();
		self
	}

	pub fn with_namespace_separator( mut self, separator: char, replacement: Option<char> ) -> Self {
		self.namespace_separator = separator ;
		self.namespace_separator_replacement = replacement ;
		self
	}

	pub fn with_lifecycle_interface( mut self, interface: impl Into<String> ) -> Self {
		self.lifecycle_interface = interface.into();
		self
	}

}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!( MountConfig::from_toml_str( "" ).unwrap(), MountConfig::default() );
	}

	#[test]
	fn partial_document_overrides_given_keys() {
		let config = MountConfig::from_toml_str( r#"
			search_dir = "/opt/units"
			registry_capacity = 3
			namespace_separator_replacement = "_"
		"# ).unwrap();
		assert_eq!( config.search_dir, PathBuf::from( "/opt/units" ));
		assert_eq!( config.registry_capacity, 3 );
		assert_eq!( config.namespace_separator_replacement, Some( '_' ));
		assert_eq!( config.archive_subdir, "plugins" );
	}

	#[test]
	fn zero_capacity_is_rejected() {
		let err = MountConfig::from_toml_str( "history_capacity = 0" ).unwrap_err();
		assert!( matches!( err, ConfigError::ZeroCapacity( "history_capacity" )));
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!( matches!( MountConfig::from_toml_str( "capacity = 3" ), Err( ConfigError::Toml( _ ))));
	}

	#[test]
	fn relative_sources_resolve_against_search_dir() {
		let config = MountConfig::default().with_search_dir( "/srv/plugins" );
		assert_eq!( config.resolve_source( Path::new( "a.zip" )), PathBuf::from( "/srv/plugins/a.zip" ));
		assert_eq!( config.resolve_source( Path::new( "/tmp/b.zip" )), PathBuf::from( "/tmp/b.zip" ));
	}

	#[test]
	fn missing_file_is_an_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = MountConfig::from_file( dir.path().join( "absent.toml" )).unwrap_err();
		assert!( matches!( err, ConfigError::Io( .. )));
	}

}
