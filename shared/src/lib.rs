// lib.rs - shared core of the map explorer client

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod geo;
pub mod history;
pub mod location;
pub mod model;
pub mod nearby;
pub mod observability;
pub mod providers;
pub mod search;
pub mod view;
pub mod weather;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::CoreConfig;
pub use event::Event;
pub use geo::{format_distance, haversine_distance, CoordinateError, GeoPoint};
pub use model::{Model, Place, SearchResult, ToastKind, ToastMessage};
pub use view::ViewModel;

/// The core a shell embeds: it owns the model and hands out effects.
pub type Core = crux_core::Core<Effect, App>;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const SEARCH_DEBOUNCE_MS: u64 = 280;
pub const MIN_QUERY_CHARS: usize = 3;
pub const GEOCODER_RESULT_LIMIT: u32 = 6;
pub const MAX_RECENT_SEARCHES: usize = 10;
pub const LOCATE_TIMEOUT_MS: u64 = 10_000;
pub const NEARBY_RAW_LIMIT: u32 = 20;
pub const NEARBY_RESULT_LIMIT: usize = 15;
pub const NEARBY_QUERY_TIMEOUT_S: u32 = 10;
pub const COORDINATE_TOLERANCE_DEG: f64 = 1e-5;
pub const SHARE_ZOOM: u8 = 13;

pub const DEFAULT_GEOCODER_URL: &str = "https://graphhopper.com/api/1/geocode";
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_PLACES_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_SHARE_URL: &str = "https://www.openstreetmap.org/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Storage,
    Deserialization,
    Location,
    LocationPermissionDenied,
    Configuration,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network | ErrorKind::Deserialization => {
                "Unable to reach the map service. Please try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Validation | ErrorKind::Configuration => self.message.clone(),
            ErrorKind::NotFound => "No matching location was found.".into(),
            ErrorKind::Storage => "Unable to save your history on this device.".into(),
            ErrorKind::Location => "Unable to determine your location.".into(),
            ErrorKind::LocationPermissionDenied => {
                "Location access denied. Please enable location permissions.".into()
            }
            ErrorKind::Internal => "An unexpected error occurred. Please try again.".into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

impl From<capabilities::HttpError> for AppError {
    fn from(e: capabilities::HttpError) -> Self {
        let kind = match &e {
            capabilities::HttpError::Timeout { .. } => ErrorKind::Timeout,
            capabilities::HttpError::InvalidResponse { .. } => ErrorKind::Deserialization,
            capabilities::HttpError::InvalidUrl { .. }
            | capabilities::HttpError::InvalidRequest { .. } => ErrorKind::Configuration,
            _ => ErrorKind::Network,
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<capabilities::KvError> for AppError {
    fn from(e: capabilities::KvError) -> Self {
        AppError::new(ErrorKind::Storage, e.to_string())
    }
}

impl From<capabilities::GeolocationError> for AppError {
    fn from(e: capabilities::GeolocationError) -> Self {
        let kind = match e {
            capabilities::GeolocationError::PermissionDenied => {
                ErrorKind::LocationPermissionDenied
            }
            capabilities::GeolocationError::Timeout { .. } => ErrorKind::Timeout,
            capabilities::GeolocationError::PositionUnavailable { .. }
            | capabilities::GeolocationError::Unsupported => ErrorKind::Location,
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<providers::ProviderError> for AppError {
    fn from(e: providers::ProviderError) -> Self {
        match e {
            providers::ProviderError::Http(inner) => inner.into(),
            other => AppError::new(ErrorKind::Deserialization, other.to_string()),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
