use serde::{Deserialize, Serialize};

/// Temperature unit preference, persisted as a "use Celsius" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn from_celsius_flag(use_celsius: bool) -> Self {
        if use_celsius {
            Self::Celsius
        } else {
            Self::Fahrenheit
        }
    }

    pub fn is_celsius(self) -> bool {
        self == Self::Celsius
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    /// Suffix letter shown after the degree sign
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

/// Where the reading was taken, as named by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingLocation {
    pub name: String,
    pub region: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
}

impl Condition {
    /// Icon URL usable outside a browser. The provider sends protocol-relative
    /// URLs such as `//cdn.weatherapi.com/...`.
    pub fn icon_url(&self) -> String {
        if self.icon.starts_with("//") {
            format!("https:{}", self.icon)
        } else {
            self.icon.clone()
        }
    }
}

/// Current conditions block of the provider response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: f64,
    pub temp_f: f64,
    pub condition: Condition,
    pub humidity: u8,
    pub pressure_mb: f64,
    pub vis_km: f64,
}

impl CurrentConditions {
    pub fn temperature(&self, unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Celsius => self.temp_c,
            TemperatureUnit::Fahrenheit => self.temp_f,
        }
    }
}

/// One successful lookup. Every field the view shows is required, so a
/// response missing any of them fails to deserialize; unknown fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub location: ReadingLocation,
    pub current: CurrentConditions,
}

/// Error envelope returned by the provider on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: i32,
    pub message: String,
}
