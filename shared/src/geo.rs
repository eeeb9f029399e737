use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{COORDINATE_TOLERANCE_DEG, EARTH_RADIUS_M};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

/// A validated WGS84 coordinate.
///
/// Serialized as `{ "lat": .., "lng": .. }`, matching the geocoder's `point` shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

#[derive(Serialize, Deserialize)]
struct RawPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }

    #[must_use]
    pub const fn as_tuple(self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        haversine_distance(self, other)
    }

    /// Coordinate equality used for favorites and the reference point.
    #[must_use]
    pub fn same_spot(self, other: Self, tolerance_deg: f64) -> bool {
        (self.lat - other.lat).abs() <= tolerance_deg
            && (self.lng - other.lng).abs() <= tolerance_deg
    }

    /// `"48.8566, 2.3522"`: the shortest representation of each axis.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}, {}", self.lat, self.lng)
    }

    /// Six-decimal form used for the clipboard.
    #[must_use]
    pub fn coordinates_text(self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = CoordinateError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
        }
    }
}

impl TryFrom<(f64, f64)> for GeoPoint {
    type Error = CoordinateError;

    fn try_from((lat, lng): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(lat, lng)
    }
}

/// Great-circle distance in meters.
///
/// The axis deltas are taken as absolute values so that `d(a, b)` and `d(b, a)`
/// evaluate bit-identical expressions.
#[must_use]
pub fn haversine_distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    if p1 == p2 {
        return 0.0;
    }

    let lat1_rad = p1.lat.to_radians();
    let lat2_rad = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).abs().to_radians();
    let delta_lng = (p2.lng - p1.lng).abs().to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);

    // rounding can push `a` just outside [0, 1] near identical and antipodal points
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// `"350 m"` below one kilometer, `"1.2 km"` from there on.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() || meters < 0.0 {
        return "Unknown".to_string();
    }

    if meters < 1000.0 {
        // 999.6 m rounds up to a kilometer
        let rounded = meters.round();
        if rounded >= 1000.0 {
            return "1.0 km".to_string();
        }
        format!("{rounded:.0} m")
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

#[must_use]
pub fn share_url(base: &str, point: GeoPoint, zoom: u8) -> String {
    let mut url = match url::Url::parse(base) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(base, error = %e, "invalid share url base");
            return format!(
                "{base}?mlat={}&mlon={}&zoom={zoom}",
                point.lat, point.lng
            );
        }
    };
    url.query_pairs_mut()
        .append_pair("mlat", &point.lat.to_string())
        .append_pair("mlon", &point.lng.to_string())
        .append_pair("zoom", &zoom.to_string());
    url.to_string()
}
