use serde::{Deserialize, Serialize};

use crate::providers::{self, ProviderError};
use crate::capabilities::HttpResult;

/// `current_weather` block of the forecast response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
    #[serde(default)]
    pub weathercode: Option<u16>,
}

/// WMO weather interpretation codes, grouped the way the badge shows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Fog,
    Rain,
    Snow,
    Showers,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    #[must_use]
    pub const fn from_code(code: Option<u16>) -> Self {
        match code {
            Some(0) => Self::Clear,
            Some(1..=3) => Self::PartlyCloudy,
            Some(45 | 48) => Self::Fog,
            Some(51 | 53 | 55 | 61 | 63 | 65) => Self::Rain,
            Some(71..=77) => Self::Snow,
            Some(80..=82) => Self::Showers,
            Some(95 | 96 | 99) => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }
}

/// Badge state plus the generation of the newest request.
#[derive(Debug, Default)]
pub struct WeatherState {
    generation: u64,
    current: Option<CurrentWeather>,
}

impl WeatherState {
    /// Starts a new lookup and returns its generation. The old badge is dropped.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.current = None;
        self.generation
    }

    /// Drops whatever is shown and orphans any request in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.current = None;
    }

    /// Applies a response. Returns `false` when it was stale and ignored.
    pub fn apply(&mut self, generation: u64, result: HttpResult) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale weather response");
            return false;
        }
        self.current = match providers::parse_weather(result) {
            Ok(weather) => Some(weather),
            Err(ProviderError::MissingField(field)) => {
                tracing::debug!(field, "weather response without current conditions");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "weather lookup failed");
                None
            }
        };
        true
    }

    #[must_use]
    pub fn current(&self) -> Option<&CurrentWeather> {
        self.current.as_ref()
    }
}
