use crate::services::weather_service::WeatherServiceError;
use skylook_core::{AppError, WeatherError};

impl From<WeatherServiceError> for AppError {
    fn from(e: WeatherServiceError) -> Self {
        match e {
            WeatherServiceError::Lookup(e) => e.into(),
            WeatherServiceError::NotInitialized => AppError::Weather(WeatherError::ServiceUnavailable),
        }
    }
}
