//! Weather backend: async city lookups.
//! All network work runs off the UI thread; results are sent back via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use skylook_weather::{LookupError, WeatherProvider, WeatherReading};
use tokio::runtime::Handle;

use crate::models::weather_model::FetchRequest;

/// Error type for weather operations
#[derive(Debug)]
pub enum WeatherServiceError {
    Lookup(LookupError),
    NotInitialized,
}

impl std::fmt::Display for WeatherServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherServiceError::Lookup(e) => write!(f, "Weather error: {}", e),
            WeatherServiceError::NotInitialized => write!(f, "Weather service not initialized"),
        }
    }
}

impl std::error::Error for WeatherServiceError {}

impl WeatherServiceError {
    /// Text for the error line of the UI
    pub fn user_message(&self) -> String {
        match self {
            WeatherServiceError::Lookup(e) => e.user_message(),
            WeatherServiceError::NotInitialized => "Weather service not initialized".to_string(),
        }
    }
}

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of the lookup started for request `seq`
    FetchDone {
        seq: u64,
        result: Result<WeatherReading, WeatherServiceError>,
    },
}

/// Start the lookup described by `request` on `runtime`.
/// Sends `FetchDone` on the channel when complete.
pub fn request_fetch(
    tx: &Sender<WeatherServiceMessage>,
    runtime: &Handle,
    provider: Option<Arc<WeatherProvider>>,
    request: FetchRequest,
) {
    let tx = tx.clone();
    let seq = request.seq;

    let provider = match provider {
        Some(p) => p,
        None => {
            let _ = tx.send(WeatherServiceMessage::FetchDone {
                seq,
                result: Err(WeatherServiceError::NotInitialized),
            });
            return;
        }
    };

    tracing::debug!("Dispatching lookup #{} for {:?}", seq, request.city);
    runtime.spawn(async move {
        let result = provider
            .fetch_current(&request.city)
            .await
            .map_err(WeatherServiceError::Lookup);
        if tx.send(WeatherServiceMessage::FetchDone { seq, result }).is_err() {
            tracing::debug!("UI gone before lookup #{} finished", seq);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather_model::FetchOrigin;
    use std::sync::mpsc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(seq: u64, city: &str) -> FetchRequest {
        FetchRequest {
            seq,
            city: city.to_string(),
            origin: FetchOrigin::Input,
        }
    }

    #[test]
    fn weather_error_display() {
        assert!(format!("{}", WeatherServiceError::NotInitialized).contains("not initialized"));
    }

    #[test]
    fn missing_provider_reports_not_initialized() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (tx, rx) = mpsc::channel();

        request_fetch(&tx, runtime.handle(), None, request(7, "Paris"));

        let WeatherServiceMessage::FetchDone { seq, result } = rx.try_recv().unwrap();
        assert_eq!(seq, 7);
        assert!(matches!(result, Err(WeatherServiceError::NotInitialized)));
    }

    #[test]
    fn fetch_result_is_sent_back() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mock_server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/current.json"))
                .and(query_param("q", "Paris"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "location": {"name": "Paris", "region": "Ile-de-France", "country": "France"},
                    "current": {
                        "temp_c": 20, "temp_f": 68,
                        "condition": {"text": "Sunny", "icon": "x"},
                        "humidity": 50, "pressure_mb": 1012, "vis_km": 10
                    }
                })))
                .mount(&server)
                .await;
            server
        });

        let provider = WeatherProvider::with_base_url(&mock_server.uri(), None).unwrap();
        let (tx, rx) = mpsc::channel();
        request_fetch(&tx, runtime.handle(), Some(Arc::new(provider)), request(3, "Paris"));

        let WeatherServiceMessage::FetchDone { seq, result } =
            rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(seq, 3);
        assert_eq!(result.unwrap().location.name, "Paris");
    }
}
