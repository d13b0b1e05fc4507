//! weatherapi.com current-conditions client.

use std::time::Duration;

use reqwest::Client;
use skylook_core::{NetworkError, ReqwestErrorExt, WeatherConfig, WeatherError};
use tracing::instrument;

use crate::error::LookupError;
use crate::types::{ApiErrorEnvelope, WeatherReading};

const USER_AGENT: &str = concat!("Skylook/", env!("CARGO_PKG_VERSION"));

/// Issues one request per lookup. Holds no state besides the HTTP client and
/// credentials: nothing is cached and nothing is retried.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, LookupError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.effective_api_key(),
        })
    }

    pub fn with_base_url(base_url: &str, api_key: Option<&str>) -> Result<Self, LookupError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        })
    }

    /// Fetch current conditions for `city`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current(&self, city: &str) -> Result<WeatherReading, LookupError> {
        let url = format!("{}/current.json", self.base_url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }
        let response = request
            .query(&[("q", city)])
            .send()
            .await
            .map_err(|e| LookupError::Network(e.into_network_error()))?;

        let reading = self.handle_response(response).await?;
        tracing::info!(
            "Fetched weather for {}, {}",
            reading.location.name,
            reading.location.country
        );
        Ok(reading)
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<WeatherReading, LookupError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Network(e.into_network_error()))?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                tracing::warn!("Weather response did not match the expected shape: {}", e);
                LookupError::Provider(WeatherError::InvalidResponse(e.to_string()))
            });
        }

        match serde_json::from_str::<ApiErrorEnvelope>(&body) {
            Ok(envelope) => {
                tracing::debug!(
                    "Provider error {} (code {}): {}",
                    status,
                    envelope.error.code,
                    envelope.error.message
                );
                Err(LookupError::Provider(provider_error(
                    envelope.error.code,
                    envelope.error.message,
                )))
            }
            Err(_) => Err(LookupError::Network(NetworkError::ServerError {
                status: status.as_u16(),
                message: body,
            })),
        }
    }
}

/// Map weatherapi.com error codes onto our taxonomy.
fn provider_error(code: i32, message: String) -> WeatherError {
    match code {
        1003 | 1006 => WeatherError::LocationNotFound(message),
        1002 | 2006 | 2008 | 2009 => WeatherError::InvalidApiKey(message),
        2007 => WeatherError::QuotaExceeded(message),
        _ => WeatherError::ApiError(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paris_body() -> serde_json::Value {
        serde_json::json!({
            "location": {"name": "Paris", "region": "Ile-de-France", "country": "France"},
            "current": {
                "temp_c": 20,
                "temp_f": 68,
                "condition": {"text": "Sunny", "icon": "x"},
                "humidity": 50,
                "pressure_mb": 1012,
                "vis_km": 10
            }
        })
    }

    fn error_body(code: i32, message: &str) -> serde_json::Value {
        serde_json::json!({"error": {"code": code, "message": message}})
    }

    #[tokio::test]
    async fn test_fetch_current_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("q", "Paris"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            WeatherProvider::with_base_url(&mock_server.uri(), Some("test-key")).unwrap();
        let reading = provider.fetch_current("Paris").await.unwrap();

        assert_eq!(reading.location.name, "Paris");
        assert_eq!(reading.location.region, "Ile-de-France");
        assert_eq!(reading.current.temp_f, 68.0);
        assert_eq!(reading.current.condition.icon, "x");
    }

    #[tokio::test]
    async fn test_city_not_found_passes_provider_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(error_body(1006, "No matching location found.")),
            )
            .mount(&mock_server)
            .await;

        let provider = WeatherProvider::with_base_url(&mock_server.uri(), None).unwrap();
        let err = provider.fetch_current("Atlantis").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::Provider(WeatherError::LocationNotFound(_))
        ));
        assert_eq!(err.user_message(), "No matching location found.");
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(error_body(2006, "API key is invalid.")),
            )
            .mount(&mock_server)
            .await;

        let provider = WeatherProvider::with_base_url(&mock_server.uri(), Some("bad")).unwrap();
        let err = provider.fetch_current("Paris").await.unwrap_err();

        assert!(matches!(err, LookupError::Provider(WeatherError::InvalidApiKey(_))));
        assert_eq!(err.user_message(), "API key is invalid.");
    }

    #[tokio::test]
    async fn test_quota_exceeded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(error_body(2007, "API key has exceeded calls per month quota.")),
            )
            .mount(&mock_server)
            .await;

        let provider = WeatherProvider::with_base_url(&mock_server.uri(), Some("k")).unwrap();
        let err = provider.fetch_current("Paris").await.unwrap_err();

        assert!(matches!(err, LookupError::Provider(WeatherError::QuotaExceeded(_))));
    }

    #[tokio::test]
    async fn test_non_json_error_is_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let provider = WeatherProvider::with_base_url(&mock_server.uri(), None).unwrap();
        let err = provider.fetch_current("Paris").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::Network(NetworkError::ServerError { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": {"name": "Paris"}
            })))
            .mount(&mock_server)
            .await;

        let provider = WeatherProvider::with_base_url(&mock_server.uri(), None).unwrap();
        let err = provider.fetch_current("Paris").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::Provider(WeatherError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Nothing listens on port 1
        let provider = WeatherProvider::with_base_url("http://127.0.0.1:1", None).unwrap();
        let err = provider.fetch_current("Paris").await.unwrap_err();

        assert!(matches!(err, LookupError::Network(_)));
    }

    #[test]
    fn test_provider_error_codes() {
        assert!(matches!(
            provider_error(1006, "x".into()),
            WeatherError::LocationNotFound(_)
        ));
        assert!(matches!(
            provider_error(1002, "x".into()),
            WeatherError::InvalidApiKey(_)
        ));
        assert!(matches!(
            provider_error(9999, "x".into()),
            WeatherError::ApiError(_)
        ));
    }
}
