//! Centralized error types for Skylook.
//!
//! Every crate maps its failures into this hierarchy so the UI can pick a
//! user-facing message while logs keep the full technical context.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Local key-value storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read storage: {0}")]
    ReadFailed(String),

    #[error("Failed to write storage: {0}")]
    WriteFailed(String),

    #[error("Stored data is corrupted: {0}")]
    Corruption(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::ReadFailed(_) => "Unable to read saved settings.",
            StorageError::WriteFailed(_) => "Unable to save settings. Changes may be lost.",
            StorageError::Corruption(_) => "Saved settings were unreadable and have been reset.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Errors reported by the weather provider.
///
/// Variants carrying a `String` hold the provider's own message, which is
/// what the user sees.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Invalid weather response: {0}")]
    InvalidResponse(String),

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Location not found. Check and try again.",
            WeatherError::InvalidApiKey(_) => "Weather API key is invalid. Check settings.",
            WeatherError::QuotaExceeded(_) => "Weather API quota exceeded. Try again later.",
            WeatherError::ApiError(_) => "Weather service error. Please try again.",
            WeatherError::InvalidResponse(_) => {
                "Received an unexpected response from the weather service."
            }
            WeatherError::ServiceUnavailable => {
                "Weather service unavailable. Please try again later."
            }
        }
    }

    /// The message the provider attached to its error response, if any.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            WeatherError::LocationNotFound(m)
            | WeatherError::InvalidApiKey(m)
            | WeatherError::QuotaExceeded(m)
            | WeatherError::ApiError(m) => Some(m.as_str()).filter(|m| !m.is_empty()),
            WeatherError::InvalidResponse(_) | WeatherError::ServiceUnavailable => None,
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
