use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::geo::{CoordinateError, GeoPoint};
use crate::history::HistoryStore;
use crate::location::LocationState;
use crate::nearby::NearbyState;
use crate::search::SearchController;
use crate::weather::WeatherState;
use crate::get_current_time_ms;

/// One resolved geocoding hit. Optional fields are empty strings when unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub point: GeoPoint,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postcode: String,
}

impl Place {
    #[must_use]
    pub fn named(name: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            name: name.into(),
            point,
            country: String::new(),
            city: String::new(),
            state: String::new(),
            address: String::new(),
            postcode: String::new(),
        }
    }

    /// Placeholder for a fix whose reverse lookup failed: the name is the coordinate.
    #[must_use]
    pub fn from_coordinates(point: GeoPoint) -> Self {
        Self::named(point.label(), point)
    }

    #[must_use]
    pub fn with_point(mut self, point: GeoPoint) -> Self {
        self.point = point;
        self
    }
}

/// A non-empty, ordered list of hits plus the text that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSearchResult")]
pub struct SearchResult {
    hits: Vec<Place>,
    query: String,
}

#[derive(Deserialize)]
struct RawSearchResult {
    hits: Vec<Place>,
    query: String,
}

impl TryFrom<RawSearchResult> for SearchResult {
    type Error = &'static str;

    fn try_from(raw: RawSearchResult) -> Result<Self, Self::Error> {
        Self::new(raw.hits, raw.query).ok_or("search result must contain at least one hit")
    }
}

impl SearchResult {
    /// `None` for an empty hit list; "no results" is not a value that flows on.
    #[must_use]
    pub fn new(hits: Vec<Place>, query: impl Into<String>) -> Option<Self> {
        if hits.is_empty() {
            return None;
        }
        Some(Self {
            hits,
            query: query.into(),
        })
    }

    #[must_use]
    pub fn single(place: Place) -> Self {
        let query = place.name.clone();
        Self {
            hits: vec![place],
            query,
        }
    }

    #[must_use]
    pub fn primary(&self) -> &Place {
        &self.hits[0]
    }

    #[must_use]
    pub fn hits(&self) -> &[Place] {
        &self.hits
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub country: String,
}

impl FavoriteEntry {
    #[must_use]
    pub fn from_place(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            lat: place.point.lat(),
            lng: place.point.lng(),
            country: place.country.clone(),
        }
    }

    pub fn point(&self) -> Result<GeoPoint, CoordinateError> {
        GeoPoint::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl RecentEntry {
    #[must_use]
    pub fn from_place(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            lat: place.point.lat(),
            lng: place.point.lng(),
        }
    }

    pub fn point(&self) -> Result<GeoPoint, CoordinateError> {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// User-pinned origin for distance readouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub point: GeoPoint,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    Unknown,
    Requesting,
    Granted,
    Denied,
}

impl PermissionState {
    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Denied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at_ms: get_current_time_ms(),
            duration_ms: kind.default_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

/// Progress of the one-shot startup position lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceLookup {
    #[default]
    Idle,
    Pending,
    Done,
}

/// Session state. Owned by the core and only mutated inside `App::update`.
#[derive(Debug)]
pub struct Model {
    pub config: CoreConfig,

    pub search: SearchController,
    pub location: LocationState,
    pub history: HistoryStore,
    pub nearby: NearbyState,
    pub weather: WeatherState,

    pub reference_point: Option<ReferencePoint>,
    /// Where the map is looking; follows the current place unless the user pans.
    pub map_focus: Option<GeoPoint>,

    pub device_lookup: DeviceLookup,
    pub is_locating: bool,
    pub selection_pending: bool,
    pub location_permission: PermissionState,

    pub dark_mode: bool,
    pub active_toast: Option<ToastMessage>,
}

impl Default for Model {
    fn default() -> Self {
        Self::with_config(CoreConfig::default())
    }
}

impl Model {
    #[must_use]
    pub fn with_config(config: CoreConfig) -> Self {
        Self {
            search: SearchController::new(config.min_query_chars),
            location: LocationState::default(),
            history: HistoryStore::new(config.max_recent_searches, config.coordinate_tolerance_deg),
            nearby: NearbyState::new(config.nearby_result_limit),
            weather: WeatherState::default(),
            reference_point: None,
            map_focus: None,
            device_lookup: DeviceLookup::default(),
            is_locating: false,
            selection_pending: false,
            location_permission: PermissionState::default(),
            dark_mode: false,
            active_toast: None,
            config,
        }
    }

    /// Swaps in new settings without dropping session state.
    pub fn apply_config(&mut self, config: CoreConfig) {
        self.search.set_min_chars(config.min_query_chars);
        self.history
            .set_limits(config.max_recent_searches, config.coordinate_tolerance_deg);
        self.nearby.set_result_limit(config.nearby_result_limit);
        self.config = config;
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(ToastMessage::new(message, kind));
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }

    /// The point everything else hangs off: override first, then device.
    #[must_use]
    pub fn current_place(&self) -> Option<&Place> {
        self.location.current()
    }

    #[must_use]
    pub fn current_point(&self) -> Option<GeoPoint> {
        self.current_place().map(|p| p.point)
    }

    #[must_use]
    pub fn map_center(&self) -> Option<GeoPoint> {
        self.map_focus.or_else(|| self.current_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> Place {
        Place::named("Paris", GeoPoint::new(48.8566, 2.3522).unwrap())
    }

    #[test]
    fn test_search_result_rejects_empty_hits() {
        assert!(SearchResult::new(Vec::new(), "atlantis").is_none());
        let result = SearchResult::new(vec![paris()], "par").unwrap();
        assert_eq!(result.primary().name, "Paris");
        assert_eq!(result.query(), "par");
    }

    #[test]
    fn test_search_result_deserialize_rejects_empty() {
        let json = r#"{"hits":[],"query":"x"}"#;
        assert!(serde_json::from_str::<SearchResult>(json).is_err());
    }

    #[test]
    fn test_place_from_coordinates() {
        let point = GeoPoint::new(48.8566, 2.3522).unwrap();
        let place = Place::from_coordinates(point);
        assert_eq!(place.name, "48.8566, 2.3522");
        assert!(place.city.is_empty() && place.country.is_empty());
        assert_eq!(place.point, point);
    }

    #[test]
    fn test_favorite_entry_wire_shape() {
        let json = serde_json::to_value(FavoriteEntry::from_place(&paris())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Paris", "lat": 48.8566, "lng": 2.3522, "country": ""})
        );
    }

    #[test]
    fn test_toast_durations() {
        let toast = ToastMessage::new("Coordinates copied!", ToastKind::Success);
        assert_eq!(toast.duration_ms, 2000);
        assert!(toast.created_at_ms > 0);
        assert_eq!(ToastKind::Error.default_duration_ms(), 5000);
    }

    #[test]
    fn test_apply_config_rebounds_recents() {
        let mut model = Model::default();
        for name in ["a", "b", "c", "d"] {
            model
                .history
                .add_recent(RecentEntry::from_place(&Place::named(name, GeoPoint::new(1.0, 2.0).unwrap())));
        }
        model.apply_config(CoreConfig {
            max_recent_searches: 2,
            min_query_chars: 1,
            ..CoreConfig::default()
        });
        let names: Vec<_> = model.history.recents().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["d", "c"]);
        assert_eq!(model.config.max_recent_searches, 2);
        assert_eq!(
            model.search.input("x".into()),
            crate::search::InputOutcome::Debounce { generation: 1 }
        );
    }

    #[test]
    fn test_map_center_prefers_focus() {
        let mut model = Model::default();
        assert_eq!(model.map_center(), None);
        let focus = GeoPoint::new(1.0, 2.0).unwrap();
        model.map_focus = Some(focus);
        assert_eq!(model.map_center(), Some(focus));
    }
}
