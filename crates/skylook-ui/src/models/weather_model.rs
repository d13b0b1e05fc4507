//! Single-screen weather lookup state machine.
//!
//! The model never touches the network. Events go in through `handle`, and a
//! lookup that has to happen comes out as a `FetchRequest` for the weather
//! service to run. Its result comes back as `UiEvent::FetchDone`.

use skylook_core::AppError;
use skylook_storage::{RecentCitiesStore, UnitPreferenceStore};
use skylook_weather::{TemperatureUnit, WeatherReading};
use thiserror::Error;

use crate::services::{WeatherServiceError, WeatherServiceMessage};

/// Input rejected before any lookup is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a city name")]
    EmptyCity,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::EmptyCity => "Please enter a city name",
        }
    }
}

/// Screen state, derived from the model's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading,
    Displayed,
    Errored,
}

/// What triggered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Startup,
    Input,
    Recent,
}

/// A lookup the model wants performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub city: String,
    pub origin: FetchOrigin,
}

#[derive(Debug)]
pub enum UiEvent {
    /// Replace the input text
    InputChanged(String),
    InsertChar(char),
    DeleteChar,
    /// Commit key pressed in the input field
    Submit,
    /// A recent-city entry was chosen
    SelectRecent(usize),
    ToggleUnit,
    FetchDone {
        seq: u64,
        result: Result<WeatherReading, WeatherServiceError>,
    },
}

impl From<WeatherServiceMessage> for UiEvent {
    fn from(msg: WeatherServiceMessage) -> Self {
        match msg {
            WeatherServiceMessage::FetchDone { seq, result } => UiEvent::FetchDone { seq, result },
        }
    }
}

pub struct WeatherModel {
    input: String,
    // Rejected submit; only a new lookup clears it, not the completion of an older one
    validation_error: Option<ValidationError>,
    error_message: Option<String>,
    reading: Option<WeatherReading>,
    recent_cities: Vec<String>,
    unit: TemperatureUnit,
    // Only the latest request is applied; older responses are dropped.
    pending: Option<FetchRequest>,
    next_seq: u64,
    recent_store: RecentCitiesStore,
    unit_store: UnitPreferenceStore,
}

impl WeatherModel {
    pub fn new(recent_store: RecentCitiesStore, unit_store: UnitPreferenceStore) -> Self {
        let recent_cities = recent_store.load_all();
        let unit = unit_store.load();
        tracing::info!(
            "Loaded {} recent cities, unit {:?}",
            recent_cities.len(),
            unit
        );

        Self {
            input: String::new(),
            validation_error: None,
            error_message: None,
            reading: None,
            recent_cities,
            unit,
            pending: None,
            next_seq: 1,
            recent_store,
            unit_store,
        }
    }

    /// Kick off the lookup for the most recently used city, if any.
    pub fn start(&mut self) -> Option<FetchRequest> {
        let city = self.recent_cities.first()?.clone();
        Some(self.begin_fetch(city, FetchOrigin::Startup))
    }

    /// Apply one event. Returns the lookup to perform, if the event needs one.
    pub fn handle(&mut self, event: UiEvent) -> Option<FetchRequest> {
        match event {
            UiEvent::InputChanged(text) => {
                self.input = text;
                None
            }
            UiEvent::InsertChar(c) => {
                self.input.push(c);
                None
            }
            UiEvent::DeleteChar => {
                self.input.pop();
                None
            }
            UiEvent::Submit => self.submit(),
            UiEvent::SelectRecent(index) => {
                let city = self.recent_cities.get(index)?.clone();
                Some(self.begin_fetch(city, FetchOrigin::Recent))
            }
            UiEvent::ToggleUnit => {
                self.toggle_unit();
                None
            }
            UiEvent::FetchDone { seq, result } => {
                self.finish_fetch(seq, result);
                None
            }
        }
    }

    fn submit(&mut self) -> Option<FetchRequest> {
        if self.input.trim().is_empty() {
            self.validation_error = Some(ValidationError::EmptyCity);
            return None;
        }
        let city = self.input.clone();
        Some(self.begin_fetch(city, FetchOrigin::Input))
    }

    fn begin_fetch(&mut self, city: String, origin: FetchOrigin) -> FetchRequest {
        let request = FetchRequest {
            seq: self.next_seq,
            city,
            origin,
        };
        self.next_seq += 1;

        if let Some(stale) = self.pending.replace(request.clone()) {
            tracing::debug!(
                "Lookup #{} superseded by #{}",
                stale.seq,
                request.seq
            );
        }
        self.validation_error = None;
        self.error_message = None;
        request
    }

    fn finish_fetch(&mut self, seq: u64, result: Result<WeatherReading, WeatherServiceError>) {
        let request = match self.pending.take() {
            Some(p) if p.seq == seq => p,
            other => {
                tracing::debug!("Discarding stale lookup result #{}", seq);
                self.pending = other;
                return;
            }
        };

        match result {
            Ok(reading) => {
                self.reading = Some(reading);
                self.error_message = None;
                if request.origin == FetchOrigin::Input {
                    self.input.clear();
                }
                self.record_use(&request.city);
            }
            Err(e) => {
                let message = e.user_message();
                let error: AppError = e.into();
                tracing::warn!("Lookup for {:?} failed: {}", request.city, error);
                self.error_message = Some(message);
            }
        }
    }

    fn record_use(&mut self, city: &str) {
        match self.recent_store.record_use(city) {
            Ok(cities) => self.recent_cities = cities,
            Err(e) => {
                tracing::warn!("Recent cities not saved: {}", AppError::from(e));
                if !self.recent_cities.iter().any(|c| c == city) {
                    self.recent_cities.insert(0, city.to_string());
                }
            }
        }
    }

    fn toggle_unit(&mut self) {
        self.unit = self.unit.toggled();
        if let Err(e) = self.unit_store.save(self.unit) {
            tracing::warn!("Unit preference not saved: {}", AppError::from(e));
        }
    }

    pub fn state(&self) -> ViewState {
        if self.validation_error.is_some() {
            ViewState::Errored
        } else if self.pending.is_some() {
            ViewState::Loading
        } else if self.error_message.is_some() {
            ViewState::Errored
        } else if self.reading.is_some() {
            ViewState::Displayed
        } else {
            ViewState::Idle
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.validation_error
            .as_ref()
            .map(ValidationError::message)
            .or(self.error_message.as_deref())
    }

    pub fn reading(&self) -> Option<&WeatherReading> {
        self.reading.as_ref()
    }

    pub fn recent_cities(&self) -> &[String] {
        &self.recent_cities
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Whether `city` names the location currently displayed (case-insensitive)
    pub fn is_active_city(&self, city: &str) -> bool {
        self.reading
            .as_ref()
            .is_some_and(|r| r.location.name.to_lowercase() == city.to_lowercase())
    }
}
