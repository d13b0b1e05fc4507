//! Durable local state for Skylook: a small string key-value store and the
//! two stores built on it (recently searched cities, temperature unit).

pub mod kv;
pub mod preference;
pub mod recent;

pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use preference::UnitPreferenceStore;
pub use recent::RecentCitiesStore;
