use std::sync::Arc;

use skylook_core::StorageError;
use skylook_weather::TemperatureUnit;

use crate::kv::KeyValueStore;

/// Storage key of the unit flag (`"true"` means Celsius).
pub const USE_CELSIUS_KEY: &str = "isCelsius";

#[derive(Clone)]
pub struct UnitPreferenceStore {
    kv: Arc<dyn KeyValueStore>,
}

impl UnitPreferenceStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Anything other than a stored `"true"` reads as Fahrenheit.
    pub fn load(&self) -> TemperatureUnit {
        match self.kv.get(USE_CELSIUS_KEY) {
            Ok(value) => TemperatureUnit::from_celsius_flag(value.as_deref() == Some("true")),
            Err(e) => {
                tracing::warn!("Failed to read unit preference: {}", e);
                TemperatureUnit::default()
            }
        }
    }

    pub fn save(&self, unit: TemperatureUnit) -> Result<(), StorageError> {
        let value = if unit.is_celsius() { "true" } else { "false" };
        self.kv.set(USE_CELSIUS_KEY, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;

    #[test]
    fn test_defaults_to_fahrenheit() {
        let prefs = UnitPreferenceStore::new(Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(prefs.load(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_save_and_load() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let prefs = UnitPreferenceStore::new(kv.clone());

        prefs.save(TemperatureUnit::Celsius).unwrap();
        assert_eq!(kv.get(USE_CELSIUS_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(prefs.load(), TemperatureUnit::Celsius);

        prefs.save(TemperatureUnit::Fahrenheit).unwrap();
        assert_eq!(kv.get(USE_CELSIUS_KEY).unwrap().as_deref(), Some("false"));
        assert_eq!(prefs.load(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_unexpected_value_reads_fahrenheit() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(USE_CELSIUS_KEY, "TRUE").unwrap();
        assert_eq!(UnitPreferenceStore::new(kv).load(), TemperatureUnit::Fahrenheit);
    }
}
