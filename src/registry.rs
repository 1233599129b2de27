//! Capacity-bounded store of live plugin instances, at most one per type.

use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use indexmap::IndexMap ;
use thiserror::Error ;
use tracing::debug ;



/// Lifecycle state of a registered instance.
#[derive( Copy, Clone, Debug, PartialEq, Eq, Hash )]
pub enum PluginState {
	/// Instantiated and registered, not (yet) accepted by a host.
	Loaded,
	/// Accepted by the host's menu callback.
	Mounted,
	/// Being torn down; removed from the registry right after.
	Unmounted,
}

impl std::fmt::Display for PluginState {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Loaded => write!( f, "loaded" ),
			Self::Mounted => write!( f, "mounted" ),
			Self::Unmounted => write!( f, "unmounted" ),
		}
	}
}

/// Which bounded collection ran out of room.
#[derive( Copy, Clone, Debug, PartialEq, Eq, Hash )]
pub enum Bound {
	Registry,
	PathHistory,
}

impl std::fmt::Display for Bound {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
		match self {
			Self::Registry => write!( f, "plugin registry" ),
			Self::PathHistory => write!( f, "path history" ),
		}
	}
}

/// A bounded collection is full.
#[derive( Error, Debug, Clone, Copy, PartialEq, Eq )]
#[error( "Capacity of the {bound} exceeded ({capacity} entries)" )]
pub struct CapacityExceeded {
	pub bound: Bound,
	pub capacity: usize,
}

/// Registry bookkeeping for one live instance.
pub struct PluginRecord<I> {
	type_id: String,
	instance: Arc<I>,
	state: PluginState,
}

impl<I> PluginRecord<I> {
	#[inline] pub fn type_id( &self ) -> &str { &self.type_id }
	#[inline] pub fn instance( &self ) -> &Arc<I> { &self.instance }
	#[inline] pub fn state( &self ) -> PluginState { self.state }
}

// Derived `Clone` would require `I: Clone`.
impl<I> Clone for PluginRecord<I> {
	fn clone( &self ) -> Self {
		Self { type_id: self.type_id.clone(), instance: Arc::clone( &self.instance ), state: self.state }
	}
}

impl<I> std::fmt::Debug for PluginRecord<I> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "PluginRecord" )
			.field( "type_id", &self.type_id )
			.field( "instance", &"<Instance>" )
			.field( "state", &self.state )
			.finish()
	}
}

/// Holds at most one instance per type identifier and never more than
/// `capacity` instances in total.
///
/// Records keep their insertion order, which is the order [`Registry::list`]
/// and [`Registry::records`] report them in.
pub struct Registry<I> {
	capacity: usize,
	records: Mutex<IndexMap<String, PluginRecord<I>>>,
}

impl<I> Registry<I> {

	pub fn new( capacity: usize ) -> Self {
		Self { capacity, records: Mutex::new( IndexMap::new() ) }
	}

	/// Returns the instance registered under `type_id`, creating it with `factory`
	/// if there is none.
	///
	/// The boolean is `true` when this call created the instance. The factory runs
	/// while the registry is locked, so it is never invoked twice for one type, and
	/// it is not invoked at all when the type is present or the registry is full.
	///
	/// # Errors
	/// [`CapacityExceeded`] (converted into `E`) if the registry is full, or whatever
	/// the factory fails with.
	pub fn get_or_create<E, F>( &self, type_id: &str, factory: F ) -> Result<( Arc<I>, bool ), E>
	where
		E: From<CapacityExceeded>,
		F: FnOnce() -> Result<I, E>,
	{
		let mut records = self.lock();
		if let Some( record ) = records.get( type_id ) {
			return Ok(( Arc::clone( &record.instance ), false ));
		}
		if records.len() >= self.capacity {
			return Err( CapacityExceeded { bound: Bound::Registry, capacity: self.capacity }.into() );
		}
		let instance = Arc::new( factory()? );
		records.insert( type_id.to_string(), PluginRecord {
			type_id: type_id.to_string(),
			instance: Arc::clone( &instance ),
			state: PluginState::Loaded,
		});
		debug!( target: "wasm_mount::registry", type_id, count = records.len(), "instance registered" );
		Ok(( instance, true ))
	}

	/// Removes the record for `type_id`. Returns `false` if there was none.
	pub fn remove( &self, type_id: &str ) -> bool {
		self.take( type_id ).is_some()
	}

	/// Removes and returns the record for `type_id`.
	pub fn take( &self, type_id: &str ) -> Option<PluginRecord<I>> {
		let mut records = self.lock();
		let record = records.shift_remove( type_id )?;
		debug!( target: "wasm_mount::registry", type_id, count = records.len(), "instance removed" );
		Some( record )
	}

	#[inline] pub fn capacity( &self ) -> usize { self.capacity }
	pub fn count( &self ) -> usize { self.lock().len() }
	pub fn contains( &self, type_id: &str ) -> bool { self.lock().contains_key( type_id ) }

	pub fn get( &self, type_id: &str ) -> Option<Arc<I>> {
		self.lock().get( type_id ).map(| record | Arc::clone( &record.instance ))
	}

	pub fn state( &self, type_id: &str ) -> Option<PluginState> {
		self.lock().get( type_id ).map(| record | record.state )
	}

	/// Updates the state of a registered type. Returns `false` if it is not registered.
	pub fn set_state( &self, type_id: &str, state: PluginState ) -> bool {
		match self.lock().get_mut( type_id ) {
			Some( record ) => { record.state = state ; true },
			None => false,
		}
	}

	/// Snapshot of all live instances in insertion order.
	pub fn list( &self ) -> Vec<Arc<I>> {
		self.lock().values().map(| record | Arc::clone( &record.instance )).collect()
	}

	/// Snapshot of all records in insertion order.
	pub fn records( &self ) -> Vec<PluginRecord<I>> {
		self.lock().values().cloned().collect()
	}

	pub fn type_ids( &self ) -> Vec<String> {
		self.lock().keys().cloned().collect()
	}

	// Every mutation is a single map operation, so the map is consistent even if a
	// factory panicked while the lock was held.
	fn lock( &self ) -> MutexGuard<'_, IndexMap<String, PluginRecord<I>>> {
		self.records.lock().unwrap_or_else( PoisonError::into_inner )
	}

}

impl<I> std::fmt::Debug for Registry<I> {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "Registry" )
			.field( "capacity", &self.capacity )
			.field( "type_ids", &self.type_ids() )
			.finish()
	}
}

#[cfg( test )]
mod tests {

	use super::* ;
	use std::sync::atomic::{ AtomicUsize, Ordering };

	fn create( value: u32 ) -> impl FnOnce() -> Result<u32, CapacityExceeded> {
		move || Ok( value )
	}

	#[test]
	fn full_registry_rejects_new_types() {
		let registry = Registry::<u32>::new( 2 );
		registry.get_or_create( "A", create( 1 )).unwrap();
		registry.get_or_create( "B", create( 2 )).unwrap();

		let called = AtomicUsize::new( 0 );
		let result = registry.get_or_create::<CapacityExceeded, _>( "C", || {
			called.fetch_add( 1, Ordering::SeqCst );
			Ok( 3 )
		});

		assert_eq!( result.unwrap_err(), CapacityExceeded { bound: Bound::Registry, capacity: 2 });
		assert_eq!( registry.count(), 2 );
		assert_eq!( called.load( Ordering::SeqCst ), 0 );
		assert!( !registry.contains( "C" ));
	}

	#[test]
	fn full_registry_still_returns_existing_types() {
		let registry = Registry::<u32>::new( 1 );
		registry.get_or_create( "A", create( 1 )).unwrap();
		let ( instance, created ) = registry.get_or_create( "A", create( 9 )).unwrap();
		assert_eq!( *instance, 1 );
		assert!( !created );
	}

	#[test]
	fn second_request_returns_the_same_instance() {
		let registry = Registry::<u32>::new( 4 );
		let ( first, created ) = registry.get_or_create( "A", create( 1 )).unwrap();
		assert!( created );
		let ( second, created ) = registry.get_or_create( "A", || -> Result<u32, CapacityExceeded> {
			panic!( "factory must not run for a registered type" )
		}).unwrap();
		assert!( !created );
		assert!( Arc::ptr_eq( &first, &second ));
		assert_eq!( registry.count(), 1 );
	}

	#[test]
	fn failed_factory_registers_nothing() {
		let registry = Registry::<u32>::new( 4 );
		let result = registry.get_or_create( "A", || Err( CapacityExceeded { bound: Bound::PathHistory, capacity: 0 }));
		assert!( result.is_err() );
		assert_eq!( registry.count(), 0 );
	}

	#[test]
	fn records_keep_insertion_order() {
		let registry = Registry::<u32>::new( 4 );
		for ( index, id ) in [ "C", "A", "B" ].into_iter().enumerate() {
			registry.get_or_create( id, create( index as u32 )).unwrap();
		}
		assert!( registry.remove( "A" ));
		assert!( !registry.remove( "A" ));
		assert_eq!( registry.type_ids(), vec![ "C".to_string(), "B".to_string() ]);
		assert_eq!( registry.list().iter().map(| i | **i ).collect::<Vec<_>>(), vec![ 0, 2 ]);
	}

	#[test]
	fn state_transitions() {
		let registry = Registry::<u32>::new( 4 );
		registry.get_or_create( "A", create( 1 )).unwrap();
		assert_eq!( registry.state( "A" ), Some( PluginState::Loaded ));
		assert!( registry.set_state( "A", PluginState::Mounted ));
		assert_eq!( registry.records()[0].state(), PluginState::Mounted );
		assert!( !registry.set_state( "B", PluginState::Mounted ));
		let record = registry.take( "A" ).unwrap();
		assert_eq!( record.type_id(), "A" );
		assert_eq!( registry.state( "A" ), None );
	}

	#[test]
	fn concurrent_requests_construct_once() {
		let registry = Arc::new( Registry::<u32>::new( 4 ));
		let constructed = Arc::new( AtomicUsize::new( 0 ));

		let handles = ( 0..8 ).map(|_| {
			let registry = Arc::clone( &registry );
			let constructed = Arc::clone( &constructed );
			std::thread::spawn( move || {
				registry.get_or_create::<CapacityExceeded, _>( "A", || {
					constructed.fetch_add( 1, Ordering::SeqCst );
					Ok( 7 )
				}).unwrap().1
			})
		}).collect::<Vec<_>>();

		let created = handles.into_iter().map(| h | h.join().unwrap() ).filter(| c | *c ).count();
		assert_eq!( created, 1 );
		assert_eq!( constructed.load( Ordering::SeqCst ), 1 );
		assert_eq!( registry.count(), 1 );
	}

}
