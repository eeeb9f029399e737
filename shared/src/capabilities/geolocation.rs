use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{CoordinateError, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: Option<u64>,
}

impl PositionOptions {
    #[must_use]
    pub const fn high_accuracy(timeout_ms: u64) -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: Some(timeout_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeolocationOperation {
    CurrentPosition(PositionOptions),
}

impl Operation for GeolocationOperation {
    type Output = GeolocationResult;
}

/// A raw device fix as reported by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
}

impl Position {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy_m: None,
        }
    }

    pub fn point(&self) -> Result<GeoPoint, CoordinateError> {
        GeoPoint::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {reason}")]
    PositionUnavailable { reason: String },

    #[error("position request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("geolocation is not supported on this platform")]
    Unsupported,
}

pub type GeolocationResult = Result<Position, GeolocationError>;

/// One-shot device position queries.
#[derive(Capability)]
pub struct Geolocation<Ev> {
    context: CapabilityContext<GeolocationOperation, Ev>,
}

impl<Ev> Clone for Geolocation<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Geolocation<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn current_position<F>(&self, options: PositionOptions, make_event: F)
    where
        F: FnOnce(GeolocationResult) -> Ev + Send + 'static,
    {
        tracing::debug!(
            high_accuracy = options.enable_high_accuracy,
            timeout_ms = options.timeout_ms,
            "position requested"
        );
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(GeolocationOperation::CurrentPosition(options))
                .await;
            context.update_app(make_event(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_accuracy_options() {
        let options = PositionOptions::high_accuracy(10_000);
        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout_ms, Some(10_000));
        assert_eq!(PositionOptions::default().timeout_ms, None);
    }

    #[test]
    fn test_options_serialize_camel_case() {
        let json = serde_json::to_value(PositionOptions::high_accuracy(10_000)).unwrap();
        assert_eq!(json["enableHighAccuracy"], true);
        assert_eq!(json["timeoutMs"], 10_000);
    }

    #[test]
    fn test_position_rejects_invalid_fix() {
        assert!(Position::new(48.8566, 2.3522).point().is_ok());
        assert!(Position::new(f64::NAN, 2.0).point().is_err());
    }
}
