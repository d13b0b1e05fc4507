use skylook_core::{AppError, NetworkError, WeatherError};
use thiserror::Error;

/// Failure of a single city lookup.
///
/// Provider-reported and transport failures both end up as one displayed
/// string via `user_message()`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Provider(#[from] WeatherError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl LookupError {
    /// Message shown to the user. Provider messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Provider(e) => e
                .provider_message()
                .map(str::to_string)
                .unwrap_or_else(|| e.user_message().to_string()),
            LookupError::Network(e) => e.user_message().to_string(),
            LookupError::Client(_) => "Weather service not initialized".to_string(),
        }
    }
}

impl From<LookupError> for AppError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::Provider(e) => AppError::Weather(e),
            LookupError::Network(e) => AppError::Network(e),
            LookupError::Client(_) => AppError::Weather(WeatherError::ServiceUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_passes_through() {
        let err = LookupError::Provider(WeatherError::LocationNotFound(
            "No matching location found.".into(),
        ));
        assert_eq!(err.user_message(), "No matching location found.");
    }

    #[test]
    fn test_invalid_response_uses_generic_message() {
        let err = LookupError::Provider(WeatherError::InvalidResponse("missing field".into()));
        assert_eq!(
            err.user_message(),
            "Received an unexpected response from the weather service."
        );
    }

    #[test]
    fn test_network_message() {
        let err = LookupError::Network(NetworkError::ConnectionFailed("refused".into()));
        assert!(err.user_message().contains("internet connection"));
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LookupError::Client("tls".into()).into();
        assert!(matches!(
            app,
            AppError::Weather(WeatherError::ServiceUnavailable)
        ));
    }
}
