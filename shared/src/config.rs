use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::ValidatedUrl;
use crate::{
    COORDINATE_TOLERANCE_DEG, DEFAULT_GEOCODER_URL, DEFAULT_PLACES_URL, DEFAULT_SHARE_URL,
    DEFAULT_WEATHER_URL, GEOCODER_RESULT_LIMIT, LOCATE_TIMEOUT_MS, MAX_RECENT_SEARCHES,
    MIN_QUERY_CHARS, NEARBY_RAW_LIMIT, NEARBY_RESULT_LIMIT, SEARCH_DEBOUNCE_MS, SHARE_ZOOM,
};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid config document: {0}")]
    Parse(String),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Runtime settings supplied by the shell. Missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub geocoder_url: String,
    pub geocoder_api_key: Option<String>,
    pub weather_url: String,
    pub places_url: String,
    pub share_url: String,
    pub share_zoom: u8,

    pub search_debounce_ms: u64,
    pub min_query_chars: usize,
    pub geocoder_result_limit: u32,
    pub max_recent_searches: usize,
    pub locate_timeout_ms: u64,
    pub nearby_raw_limit: u32,
    pub nearby_result_limit: usize,
    pub coordinate_tolerance_deg: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_api_key: None,
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            places_url: DEFAULT_PLACES_URL.to_string(),
            share_url: DEFAULT_SHARE_URL.to_string(),
            share_zoom: SHARE_ZOOM,
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
            min_query_chars: MIN_QUERY_CHARS,
            geocoder_result_limit: GEOCODER_RESULT_LIMIT,
            max_recent_searches: MAX_RECENT_SEARCHES,
            locate_timeout_ms: LOCATE_TIMEOUT_MS,
            nearby_raw_limit: NEARBY_RAW_LIMIT,
            nearby_result_limit: NEARBY_RESULT_LIMIT,
            coordinate_tolerance_deg: COORDINATE_TOLERANCE_DEG,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document such as `{"geocoder_api_key": "..."}`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, url) in [
            ("geocoder_url", &self.geocoder_url),
            ("weather_url", &self.weather_url),
            ("places_url", &self.places_url),
            ("share_url", &self.share_url),
        ] {
            ValidatedUrl::new(url).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            })?;
        }

        if self.geocoder_api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(invalid("geocoder_api_key", "must not be blank when set"));
        }
        if self.min_query_chars == 0 {
            return Err(invalid("min_query_chars", "must be at least 1"));
        }
        if self.geocoder_result_limit == 0 {
            return Err(invalid("geocoder_result_limit", "must be at least 1"));
        }
        if self.max_recent_searches == 0 {
            return Err(invalid("max_recent_searches", "must be at least 1"));
        }
        if self.locate_timeout_ms == 0 {
            return Err(invalid("locate_timeout_ms", "must be positive"));
        }
        if self.nearby_raw_limit == 0 || self.nearby_result_limit == 0 {
            return Err(invalid("nearby_result_limit", "limits must be at least 1"));
        }
        if !(self.coordinate_tolerance_deg.is_finite() && self.coordinate_tolerance_deg > 0.0) {
            return Err(invalid(
                "coordinate_tolerance_deg",
                "must be a positive number of degrees",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search_debounce_ms, 280);
        assert_eq!(config.max_recent_searches, 10);
        assert!(config.geocoder_api_key.is_none());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = CoreConfig::from_json(r#"{"geocoder_api_key":"abc","share_zoom":15}"#).unwrap();
        assert_eq!(config.geocoder_api_key.as_deref(), Some("abc"));
        assert_eq!(config.share_zoom, 15);
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            CoreConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_zero_limits() {
        let err = CoreConfig::from_json(r#"{"max_recent_searches":0}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                field: "max_recent_searches",
                reason: "must be at least 1".into()
            }
        );
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        assert!(CoreConfig::from_json(r#"{"coordinate_tolerance_deg":0.0}"#).is_err());
        assert!(CoreConfig::from_json(r#"{"coordinate_tolerance_deg":-1.0}"#).is_err());
    }

    #[test]
    fn test_rejects_bad_url() {
        let err = CoreConfig::from_json(r#"{"weather_url":"ftp://weather"}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "weather_url",
                ..
            }
        ));
    }
}
