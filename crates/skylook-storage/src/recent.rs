use std::sync::Arc;

use parking_lot::Mutex;
use skylook_core::StorageError;

use crate::kv::KeyValueStore;

/// Storage key of the recent-city list (JSON array of strings).
pub const RECENT_CITIES_KEY: &str = "cityName";

/// Ordered, duplicate-free list of searched cities, most recent first.
#[derive(Clone)]
pub struct RecentCitiesStore {
    kv: Arc<dyn KeyValueStore>,
    // List that `record_use` builds on. Kept across failed writes so the next
    // successful write still includes every recorded city.
    working: Arc<Mutex<Option<Vec<String>>>>,
}

impl RecentCitiesStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            working: Arc::new(Mutex::new(None)),
        }
    }

    /// Read the persisted list. Missing or unreadable data yields an empty list.
    pub fn load_all(&self) -> Vec<String> {
        let raw = match self.kv.get(RECENT_CITIES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read recent cities: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(cities) => cities,
            Err(e) => {
                tracing::warn!("Ignoring corrupt recent city list: {}", e);
                Vec::new()
            }
        }
    }

    /// Record a successful lookup of `city`.
    ///
    /// A new city is prepended. A city already in the list keeps its position.
    /// Matching is case-sensitive. The list is persisted before returning.
    pub fn record_use(&self, city: &str) -> Result<Vec<String>, StorageError> {
        let cities = {
            let mut working = self.working.lock();
            let cities = working.get_or_insert_with(|| self.load_all());
            if !cities.iter().any(|c| c == city) {
                cities.insert(0, city.to_string());
            }
            cities.clone()
        };

        let json =
            serde_json::to_string(&cities).map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        self.kv.set(RECENT_CITIES_KEY, &json)?;

        Ok(cities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{FileKeyValueStore, MemoryKeyValueStore};

    fn store() -> (RecentCitiesStore, Arc<MemoryKeyValueStore>) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        (RecentCitiesStore::new(kv.clone()), kv)
    }

    #[test]
    fn test_empty_when_absent() {
        let (recent, _) = store();
        assert!(recent.load_all().is_empty());
    }

    #[test]
    fn test_corrupt_value_reads_empty() {
        let (recent, kv) = store();
        kv.set(RECENT_CITIES_KEY, "[\"Paris\",").unwrap();
        assert!(recent.load_all().is_empty());

        kv.set(RECENT_CITIES_KEY, "{\"a\":1}").unwrap();
        assert!(recent.load_all().is_empty());
    }

    #[test]
    fn test_new_city_is_prepended_and_persisted() {
        let (recent, kv) = store();
        recent.record_use("Paris").unwrap();
        let cities = recent.record_use("Oslo").unwrap();

        assert_eq!(cities, vec!["Oslo", "Paris"]);
        assert_eq!(
            kv.get(RECENT_CITIES_KEY).unwrap().as_deref(),
            Some("[\"Oslo\",\"Paris\"]")
        );
    }

    #[test]
    fn test_record_use_twice_keeps_single_entry_at_front() {
        let (recent, _) = store();
        recent.record_use("Paris").unwrap();
        recent.record_use("Lima").unwrap();
        recent.record_use("Lima").unwrap();

        let cities = recent.load_all();
        assert_eq!(cities.iter().filter(|c| *c == "Lima").count(), 1);
        assert_eq!(cities[0], "Lima");
    }

    #[test]
    fn test_existing_city_keeps_its_position() {
        let (recent, _) = store();
        recent.record_use("Paris").unwrap();
        recent.record_use("Oslo").unwrap();
        recent.record_use("Lima").unwrap();

        let cities = recent.record_use("Paris").unwrap();
        assert_eq!(cities, vec!["Lima", "Oslo", "Paris"]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let (recent, _) = store();
        recent.record_use("paris").unwrap();
        let cities = recent.record_use("Paris").unwrap();
        assert_eq!(cities, vec!["Paris", "paris"]);
    }

    /// Memory store whose next `set` can be made to fail.
    struct FlakyStore {
        inner: MemoryKeyValueStore,
        fail_next_set: Mutex<bool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if std::mem::take(&mut *self.fail_next_set.lock()) {
                return Err(StorageError::WriteFailed("disk full".into()));
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_city_from_failed_write_is_kept_by_next_write() {
        let kv = Arc::new(FlakyStore {
            inner: MemoryKeyValueStore::new(),
            fail_next_set: Mutex::new(false),
        });
        let recent = RecentCitiesStore::new(kv.clone());
        recent.record_use("Paris").unwrap();

        *kv.fail_next_set.lock() = true;
        assert!(recent.record_use("Oslo").is_err());
        assert_eq!(
            kv.get(RECENT_CITIES_KEY).unwrap().as_deref(),
            Some("[\"Paris\"]")
        );

        let cities = recent.record_use("Lima").unwrap();
        assert_eq!(cities, vec!["Lima", "Oslo", "Paris"]);
        assert_eq!(recent.load_all(), vec!["Lima", "Oslo", "Paris"]);
    }

    #[test]
    fn test_survives_restart_with_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let kv = Arc::new(FileKeyValueStore::open(&path).unwrap());
            let recent = RecentCitiesStore::new(kv);
            recent.record_use("Paris").unwrap();
            recent.record_use("Tokyo").unwrap();
        }

        let kv = Arc::new(FileKeyValueStore::open(&path).unwrap());
        assert_eq!(RecentCitiesStore::new(kv).load_all(), vec!["Tokyo", "Paris"]);
    }
}
