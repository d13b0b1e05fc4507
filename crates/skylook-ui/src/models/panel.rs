//! Display strings for one frame, computed from the model.
//! Kept free of terminal types so the formatting rules are testable.

use skylook_weather::{TemperatureUnit, WeatherReading};

use super::weather_model::{ViewState, WeatherModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentEntry {
    pub city: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingView {
    /// "name, region, country"
    pub header: String,
    /// e.g. "68 °F"
    pub temperature: String,
    pub condition: String,
    pub icon_url: String,
    pub humidity: String,
    pub pressure: String,
    pub visibility: String,
}

impl ReadingView {
    pub fn new(reading: &WeatherReading, unit: TemperatureUnit) -> Self {
        let location = &reading.location;
        let current = &reading.current;

        Self {
            header: format!("{}, {}, {}", location.name, location.region, location.country),
            temperature: format!("{} °{}", current.temperature(unit), unit.symbol()),
            condition: current.condition.text.clone(),
            icon_url: current.condition.icon_url(),
            humidity: current.humidity.to_string(),
            pressure: current.pressure_mb.to_string(),
            visibility: current.vis_km.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub input: String,
    /// True only while a lookup is the thing to show; a rejected submit wins
    pub loading: bool,
    pub error: Option<String>,
    pub unit_label: &'static str,
    pub recent: Vec<RecentEntry>,
    pub reading: Option<ReadingView>,
}

impl PanelView {
    pub fn from_model(model: &WeatherModel) -> Self {
        let unit = model.unit();

        Self {
            input: model.input().to_string(),
            loading: model.state() == ViewState::Loading,
            error: model.error_message().map(str::to_string),
            unit_label: if unit.is_celsius() { "Celsius" } else { "Fahrenheit" },
            recent: model
                .recent_cities()
                .iter()
                .map(|city| RecentEntry {
                    city: city.clone(),
                    active: model.is_active_city(city),
                })
                .collect(),
            reading: model.reading().map(|r| ReadingView::new(r, unit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather_model::UiEvent;
    use skylook_storage::{KeyValueStore, MemoryKeyValueStore, RecentCitiesStore, UnitPreferenceStore};
    use skylook_weather::{Condition, CurrentConditions, ReadingLocation};
    use std::sync::Arc;

    fn paris() -> WeatherReading {
        WeatherReading {
            location: ReadingLocation {
                name: "Paris".into(),
                region: "Ile-de-France".into(),
                country: "France".into(),
            },
            current: CurrentConditions {
                temp_c: 20.5,
                temp_f: 68.9,
                condition: Condition {
                    text: "Sunny".into(),
                    icon: "//cdn.weatherapi.com/113.png".into(),
                },
                humidity: 50,
                pressure_mb: 1012.0,
                vis_km: 10.0,
            },
        }
    }

    #[test]
    fn formats_reading_in_selected_unit() {
        let f = ReadingView::new(&paris(), TemperatureUnit::Fahrenheit);
        assert_eq!(f.header, "Paris, Ile-de-France, France");
        assert_eq!(f.temperature, "68.9 °F");
        assert_eq!(f.humidity, "50");
        assert_eq!(f.pressure, "1012");
        assert_eq!(f.visibility, "10");
        assert_eq!(f.icon_url, "https://cdn.weatherapi.com/113.png");

        let c = ReadingView::new(&paris(), TemperatureUnit::Celsius);
        assert_eq!(c.temperature, "20.5 °C");
        assert_eq!(
            ReadingView { temperature: f.temperature.clone(), ..c },
            f
        );
    }

    #[test]
    fn rejected_submit_shows_error_instead_of_loading() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set("cityName", "[\"Paris\"]").unwrap();
        let mut model = WeatherModel::new(
            RecentCitiesStore::new(kv.clone()),
            UnitPreferenceStore::new(kv),
        );
        model.start().unwrap();
        assert!(PanelView::from_model(&model).loading);

        model.handle(UiEvent::Submit);
        let view = PanelView::from_model(&model);
        assert!(!view.loading);
        assert_eq!(view.error.as_deref(), Some("Please enter a city name"));
    }
}
