//! Shared application services.
//!
//! `AppServices` is built once at startup and owns everything the UI thread
//! hands work to: the tokio runtime, the weather provider, the key-value store
//! and the channel lookup results come back on.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use skylook_core::Config;
use skylook_storage::{
    FileKeyValueStore, KeyValueStore, RecentCitiesStore, UnitPreferenceStore,
};
use skylook_weather::WeatherProvider;

use crate::models::weather_model::{FetchRequest, WeatherModel};
use crate::services::weather_service::{self, WeatherServiceMessage};

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,

    /// Weather provider; `None` when the HTTP client could not be built
    weather_provider: Option<Arc<WeatherProvider>>,

    /// Backing store for the recent-city list and unit preference
    kv: Arc<dyn KeyValueStore>,

    weather_tx: Sender<WeatherServiceMessage>,
    weather_rx: Receiver<WeatherServiceMessage>,
}

impl AppServices {
    /// Build services from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let provider = match WeatherProvider::new(&config.weather) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!("Weather provider unavailable: {}", e);
                None
            }
        };

        let kv = FileKeyValueStore::open(config.storage.store_path())
            .context("Failed to open local storage")?;

        Self::with_parts(provider, Arc::new(kv))
    }

    /// Build services from already constructed parts.
    pub fn with_parts(
        provider: Option<WeatherProvider>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("skylook-tokio")
            .build()
            .context("Failed to create tokio runtime")?;

        let (weather_tx, weather_rx) = mpsc::channel();

        Ok(Self {
            runtime,
            weather_provider: provider.map(Arc::new),
            kv,
            weather_tx,
            weather_rx,
        })
    }

    /// Create the view model wired to this instance's storage.
    pub fn build_model(&self) -> WeatherModel {
        WeatherModel::new(
            RecentCitiesStore::new(self.kv.clone()),
            UnitPreferenceStore::new(self.kv.clone()),
        )
    }

    /// Run `request` in the background; the result arrives via `try_recv`.
    pub fn request_fetch(&self, request: FetchRequest) {
        weather_service::request_fetch(
            &self.weather_tx,
            self.runtime.handle(),
            self.weather_provider.clone(),
            request,
        );
    }

    /// Next finished lookup, if one is waiting.
    pub fn try_recv(&self) -> Option<WeatherServiceMessage> {
        self.weather_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next finished lookup.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WeatherServiceMessage> {
        self.weather_rx.recv_timeout(timeout).ok()
    }
}
