#[allow( dead_code )]
mod unit_fixtures {

	use std::path::Path ;

	/// Describes a unit component exporting the lifecycle interface.
	#[derive( Debug, Clone )]
	pub struct UnitFixture {
		pub display_name: String,
		pub source_file_name: String,
		pub description: String,
		pub menu_id: u32,
		pub init_traps: bool,
		pub halt_traps: bool,
		pub omit_menu_handle: bool,
		pub signed_menu_handle: bool,
		pub cleanup_traps: bool,
	}

	impl UnitFixture {

		pub fn new( display_name: &str ) -> Self {
			Self {
				display_name: display_name.to_string(),
				source_file_name: format!( "{}.wasm", display_name ),
				description: format!( "{} test unit", display_name ),
				menu_id: 7,
				init_traps: false,
				halt_traps: false,
				omit_menu_handle: false,
				signed_menu_handle: false,
				cleanup_traps: false,
			}
		}

		pub fn with_description( mut self, description: &str ) -> Self {
			self.description = description.to_string();
			self
		}

		pub fn with_menu_id( mut self, menu_id: u32 ) -> Self {
			self.menu_id = menu_id ;
			self
		}

		pub fn trapping_init( mut self ) -> Self {
			self.init_traps = true ;
			self
		}

		pub fn trapping_halt( mut self ) -> Self {
			self.halt_traps = true ;
			self
		}

		/// Traps in the post-return cleanup of `description`.
		pub fn trapping_cleanup( mut self ) -> Self {
			self.cleanup_traps = true ;
			self
		}

		/// Leaves `menu-handle` out of the exported interface.
		pub fn without_menu_handle( mut self ) -> Self {
			self.omit_menu_handle = true ;
			self
		}

		/// Lifts `menu-handle` as `s32` instead of `u32`.
		pub fn with_signed_menu_handle( mut self ) -> Self {
			self.signed_menu_handle = true ;
			self
		}

		/// The component in WAT text form.
		pub fn wat( &self ) -> String {

			let trap = | traps: bool | if traps { "unreachable" } else { "" };
			let description_cleanup = match self.cleanup_traps {
				true => r#" (post-return (core func $i "description-post"))"#,
				false => "",
			};
			let menu_type = if self.signed_menu_handle { "s32" } else { "u32" };
			let ( menu_func, menu_export ) = match self.omit_menu_handle {
				true => ( String::new(), String::new() ),
				false => (
					format!( r#"(func $menu-handle (result {}) (canon lift (core func $i "menu-handle")))"#, menu_type ),
					r#"(export "menu-handle" (func $menu-handle))"#.to_string(),
				),
			};

			format!( r#"(component
	(core module $m
		(memory (export "memory") 1)
		(data (i32.const 64) "{display_name}")
		(data (i32.const 320) "{source_file_name}")
		(data (i32.const 576) "{description}")
		(func $ret (param i32 i32) (result i32)
			(i32.store (i32.const 0) (local.get 0))
			(i32.store (i32.const 4) (local.get 1))
			(i32.const 0))
		(func (export "init") {init})
		(func (export "halt") {halt})
		(func (export "display-name") (result i32) (call $ret (i32.const 64) (i32.const {display_name_len})))
		(func (export "source-file-name") (result i32) (call $ret (i32.const 320) (i32.const {source_file_name_len})))
		(func (export "description") (result i32) (call $ret (i32.const 576) (i32.const {description_len})))
		(func (export "menu-handle") (result i32) (i32.const {menu_id}))
		(func (export "description-post") (param i32) unreachable)
	)
	(core instance $i (instantiate $m))
	(func $init (canon lift (core func $i "init")))
	(func $halt (canon lift (core func $i "halt")))
	(func $display-name (result string) (canon lift (core func $i "display-name") (memory (core memory $i "memory"))))
	(func $source-file-name (result string) (canon lift (core func $i "source-file-name") (memory (core memory $i "memory"))))
	(func $description (result string) (canon lift (core func $i "description") (memory (core memory $i "memory")){description_cleanup}))
	{menu_func}
	(instance $lifecycle
		(export "init" (func $init))
		(export "halt" (func $halt))
		(export "display-name" (func $display-name))
		(export "source-file-name" (func $source-file-name))
		(export "description" (func $description))
		{menu_export}
	)
	(export "wasm-mount:plugin/lifecycle" (instance $lifecycle))
)"#,
				display_name = self.display_name,
				source_file_name = self.source_file_name,
				description = self.description,
				display_name_len = self.display_name.len(),
				source_file_name_len = self.source_file_name.len(),
				description_len = self.description.len(),
				menu_id = self.menu_id,
				init = trap( self.init_traps ),
				halt = trap( self.halt_traps ),
				menu_func = menu_func,
				menu_export = menu_export,
				description_cleanup = description_cleanup,
			)

		}

	}

	/// A component that does not export the lifecycle interface at all.
	pub const EMPTY_COMPONENT: &str = "(component)" ;

	/// A component that needs an import the construction protocol cannot provide.
	pub const IMPORTING_COMPONENT: &str = r#"(component
	(import "log" (func $log (param "message" string)))
)"# ;

	/// Writes `contents` to `root/relative`, creating parent directories.
	pub fn write_file( root: &Path, relative: &str, contents: impl AsRef<[u8]> ) {
		let path = root.join( relative );
		if let Some( parent ) = path.parent() { std::fs::create_dir_all( parent ).unwrap(); }
		std::fs::write( path, contents ).unwrap();
	}

}
