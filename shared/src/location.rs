use crate::geo::{haversine_distance, GeoPoint};
use crate::model::{Place, ReferencePoint, SearchResult};

/// The authoritative location: a search or selection override when present,
/// the device place otherwise. The override keeps the device place beneath it
/// so clearing the override reveals it again.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LocationState {
    #[default]
    Empty,
    Device(Place),
    Override {
        result: SearchResult,
        device: Option<Place>,
    },
}

impl LocationState {
    #[must_use]
    pub fn current(&self) -> Option<&Place> {
        match self {
            Self::Empty => None,
            Self::Device(place) => Some(place),
            Self::Override { result, .. } => Some(result.primary()),
        }
    }

    #[must_use]
    pub fn device(&self) -> Option<&Place> {
        match self {
            Self::Empty => None,
            Self::Device(place) => Some(place),
            Self::Override { device, .. } => device.as_ref(),
        }
    }

    #[must_use]
    pub fn override_result(&self) -> Option<&SearchResult> {
        match self {
            Self::Override { result, .. } => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_override(&self) -> bool {
        matches!(self, Self::Override { .. })
    }

    /// Records the device place. An active override stays on top.
    pub fn device_resolved(&mut self, place: Place) {
        *self = match std::mem::take(self) {
            Self::Override { result, .. } => Self::Override {
                result,
                device: Some(place),
            },
            Self::Empty | Self::Device(_) => Self::Device(place),
        };
    }

    /// Replaces the override slot wholesale.
    pub fn set_override(&mut self, result: SearchResult) {
        let device = self.device().cloned();
        *self = Self::Override { result, device };
    }

    pub fn clear_override(&mut self) {
        *self = match std::mem::take(self) {
            Self::Override {
                device: Some(place),
                ..
            }
            | Self::Device(place) => Self::Device(place),
            Self::Override { device: None, .. } | Self::Empty => Self::Empty,
        };
    }

    /// An explicit locate: the override goes and the fix becomes the device place.
    pub fn locate_resolved(&mut self, place: Place) {
        *self = Self::Device(place);
    }
}

/// Distance in meters from the reference point, unless the two coincide.
#[must_use]
pub fn distance_from_reference(
    reference: Option<&ReferencePoint>,
    current: Option<GeoPoint>,
    tolerance_deg: f64,
) -> Option<f64> {
    let reference = reference?;
    let current = current?;
    if reference.point.same_spot(current, tolerance_deg) {
        return None;
    }
    Some(haversine_distance(reference.point, current))
}
