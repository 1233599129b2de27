//! Unit-name normalization.
//!
//! A unit is addressed by a qualified name such as `acme.tools.Counter`. Before
//! it can be looked up in an origin the name is stripped of any recognized
//! unit or archive suffix and its namespace separators are mapped onto the
//! storage separator of that origin.

use std::path::Path ;



/// Storage path separator used by archive entries, regardless of platform.
pub const ARCHIVE_SEPARATOR: char = '/' ;

/// Rules for turning qualified unit names into storage paths and back.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct UnitNaming {
	unit_extension: String,
	archive_extension: String,
	namespace_separator: char,
	separator_replacement: Option<char>,
}

impl Default for UnitNaming {
	fn default() -> Self {
		Self {
			unit_extension: "wasm".to_string(),
			archive_extension: "zip".to_string(),
			namespace_separator: '.',
			separator_replacement: None,
		}
	}
}

impl UnitNaming {

	/// Creates naming rules from the file extensions (without the leading dot)
	/// and the namespace separator used in qualified names.
	pub fn new(
		unit_extension: impl Into<String>,
		archive_extension: impl Into<String>,
		namespace_separator: char,
	) -> Self {
		Self {
			unit_extension: unit_extension.into(),
			archive_extension: archive_extension.into(),
			namespace_separator,
			separator_replacement: None,
		}
	}

	/// Substitutes `replacement` for the namespace separator when forming storage
	/// paths, instead of the origin's own storage separator.
	pub fn with_separator_replacement( mut self, replacement: Option<char> ) -> Self {
		self.separator_replacement = replacement ;
		self
	}

	#[inline] pub fn unit_extension( &self ) -> &str { &self.unit_extension }
	#[inline] pub fn archive_extension( &self ) -> &str { &self.archive_extension }
	#[inline] pub fn namespace_separator( &self ) -> char { self.namespace_separator }

	/// Returns `true` if `path` carries the archive extension.
	pub fn is_archive( &self, path: &Path ) -> bool {
		path.extension()
			.and_then(| ext | ext.to_str())
			.is_some_and(| ext | ext.eq_ignore_ascii_case( &self.archive_extension ))
	}

	/// Normalizes a requested name into its qualified form.
	///
	/// Surrounding whitespace and a trailing unit or archive suffix are removed.
	/// Returns `None` for names that are empty, contain an empty namespace segment,
	/// or have a segment that would leave the origin's base once used as a path.
	pub fn qualified_name( &self, raw: &str ) -> Option<String> {
		let name = self.strip_suffix( raw.trim() );
		let valid = !name.is_empty()
			&& name.split( self.namespace_separator ).all( is_plain_segment );
		valid.then(|| name.to_string() )
	}

	/// Maps a qualified name onto a storage path using `separator` between
	/// namespace segments, appending the unit extension.
	pub fn storage_path( &self, qualified: &str, separator: char ) -> String {
		let separator = self.separator_replacement.unwrap_or( separator ).to_string();
		let stem = qualified.split( self.namespace_separator ).collect::<Vec<_>>().join( &separator );
		format!( "{}.{}", stem, self.unit_extension )
	}

	/// Inverse of [`Self::storage_path`] for `/`-separated relative paths.
	///
	/// Returns `None` if the path does not carry the unit extension.
	pub fn from_storage_path( &self, relative: &str ) -> Option<String> {
		let stem = strip_extension( relative, &self.unit_extension )?;
		let separator = self.separator_replacement.unwrap_or( ARCHIVE_SEPARATOR );
		let qualified = stem.split( separator )
			.collect::<Vec<_>>()
			.join( &self.namespace_separator.to_string() );
		self.qualified_name( &qualified )
	}

	fn strip_suffix<'a>( &self, name: &'a str ) -> &'a str {
		strip_extension( name, &self.unit_extension )
			.or_else(|| strip_extension( name, &self.archive_extension ))
			.unwrap_or( name )
	}

}

fn is_plain_segment( segment: &str ) -> bool {
	!segment.is_empty()
		&& segment != "." && segment != ".."
		&& !segment.contains([ '/', '\\', ':' ])
}

fn strip_extension<'a>( name: &'a str, extension: &str ) -> Option<&'a str> {
	let split = name.len().checked_sub( extension.len() + 1 )?;
	let ( stem, suffix ) = name.split_at_checked( split )?;
	let suffix = suffix.strip_prefix( '.' )?;
	suffix.eq_ignore_ascii_case( extension ).then_some( stem )
}

#[cfg( test )]
mod tests {

	use super::* ;

	#[test]
	fn strips_unit_and_archive_suffixes() {
		let naming = UnitNaming::default();
		assert_eq!( naming.qualified_name( "Foo.wasm" ).as_deref(), Some( "Foo" ));
		assert_eq!( naming.qualified_name( "Foo.ZIP" ).as_deref(), Some( "Foo" ));
		assert_eq!( naming.qualified_name( " acme.Foo " ).as_deref(), Some( "acme.Foo" ));
		assert_eq!( naming.qualified_name( "acme.Foo.wasm" ).as_deref(), Some( "acme.Foo" ));
	}

	#[test]
	fn rejects_empty_segments() {
		let naming = UnitNaming::default();
		assert_eq!( naming.qualified_name( "" ), None );
		assert_eq!( naming.qualified_name( ".wasm" ), None );
		assert_eq!( naming.qualified_name( "acme..Foo" ), None );
		assert_eq!( naming.qualified_name( "acme.Foo." ), None );
	}

	#[test]
	fn rejects_path_like_segments() {
		let naming = UnitNaming::default();
		assert_eq!( naming.qualified_name( "/tmp/Secret" ), None );
		assert_eq!( naming.qualified_name( "acme/Foo" ), None );
		assert_eq!( naming.qualified_name( "acme\\Foo" ), None );
		assert_eq!( naming.qualified_name( "C:Foo" ), None );
		let slashed = UnitNaming::new( "wasm", "zip", '/' );
		assert_eq!( slashed.qualified_name( "/tmp/Secret" ), None );
		assert_eq!( slashed.qualified_name( "acme/../Secret" ), None );
		assert_eq!( slashed.qualified_name( "acme/Foo" ).as_deref(), Some( "acme/Foo" ));
	}

	#[test]
	fn maps_namespaces_to_storage_separator() {
		let naming = UnitNaming::default();
		assert_eq!( naming.storage_path( "acme.tools.Foo", '/' ), "acme/tools/Foo.wasm" );
		assert_eq!( naming.storage_path( "Foo", '/' ), "Foo.wasm" );
	}

	#[test]
	fn replacement_overrides_storage_separator() {
		let naming = UnitNaming::default().with_separator_replacement( Some( '_' ));
		assert_eq!( naming.storage_path( "acme.tools.Foo", '/' ), "acme_tools_Foo.wasm" );
		assert_eq!( naming.from_storage_path( "acme_tools_Foo.wasm" ).as_deref(), Some( "acme.tools.Foo" ));
	}

	#[test]
	fn storage_path_round_trips_for_discovery() {
		let naming = UnitNaming::default();
		assert_eq!( naming.from_storage_path( "acme/Foo.wasm" ).as_deref(), Some( "acme.Foo" ));
		assert_eq!( naming.from_storage_path( "Readme.txt" ), None );
	}

	#[test]
	fn detects_archives_by_extension() {
		let naming = UnitNaming::default();
		assert!( naming.is_archive( Path::new( "plugins.zip" )));
		assert!( naming.is_archive( Path::new( "/opt/PLUGINS.ZIP" )));
		assert!( !naming.is_archive( Path::new( "Foo.wasm" )));
		assert!( !naming.is_archive( Path::new( "zip" )));
	}

}
