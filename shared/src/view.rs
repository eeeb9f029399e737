//! Render-ready projection of the model. Everything here is derived on each
//! call; nothing is cached between renders.

use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::geo::{format_distance, share_url, GeoPoint};
use crate::location::distance_from_reference;
use crate::model::{DeviceLookup, Model, Place, ToastKind, ToastMessage};
use crate::nearby::{NearbyCategory, NearbyPlace, SearchRadius};
use crate::weather::{CurrentWeather, WeatherCondition};

const REFERENCE_LABEL_CHARS: usize = 20;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SuggestionView {
    pub name: String,
    /// "city, state, country" with blanks skipped.
    pub detail: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchView {
    pub text: String,
    pub suggestions: Vec<SuggestionView>,
    pub show_suggestions: bool,
    pub no_results_message: Option<String>,
    pub is_submitting: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeatherView {
    pub temperature: String,
    pub wind: String,
    pub condition: WeatherCondition,
    pub code: Option<u16>,
}

impl From<&CurrentWeather> for WeatherView {
    fn from(w: &CurrentWeather) -> Self {
        let rounded = w.temperature.round();
        // -0.4 rounds to -0, which should read as 0.
        let rounded = if rounded == 0.0 { 0.0 } else { rounded };
        Self {
            temperature: format!("{rounded:.0}°C"),
            wind: format!("Wind {} km/h", w.windspeed),
            condition: WeatherCondition::from_code(w.weathercode),
            code: w.weathercode,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DistanceView {
    pub meters: f64,
    pub text: String,
    pub from_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaceView {
    pub name: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub postcode: String,
    pub lat: f64,
    pub lng: f64,
    /// Five decimals, as shown in the panel.
    pub coordinates_label: String,
    /// Six decimals, as copied to the clipboard.
    pub coordinates_text: String,
    pub share_url: String,
    pub is_favorited: bool,
    pub is_search_result: bool,
    pub distance: Option<DistanceView>,
    pub weather: Option<WeatherView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InfoPanel {
    Loading,
    Empty,
    Place(Box<PlaceView>),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MarkerView {
    pub point: GeoPoint,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedPlaceView {
    pub name: String,
    pub detail: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CategoryView {
    pub category: NearbyCategory,
    pub label: String,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RadiusView {
    pub radius: SearchRadius,
    pub label: String,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NearbyPlaceView {
    pub name: String,
    pub distance: String,
    pub opening_hours: Option<String>,
}

impl From<&NearbyPlace> for NearbyPlaceView {
    fn from(p: &NearbyPlace) -> Self {
        Self {
            name: p.name.clone(),
            distance: format_distance(p.distance_m),
            opening_hours: p.opening_hours.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NearbyView {
    pub categories: Vec<CategoryView>,
    pub radii: Vec<RadiusView>,
    pub places: Vec<NearbyPlaceView>,
    pub is_loading: bool,
    pub show_empty: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub search: SearchView,
    pub info_panel: InfoPanel,
    pub map_center: Option<GeoPoint>,
    pub marker: Option<MarkerView>,
    pub reference_label: Option<String>,
    pub favorites: Vec<SavedPlaceView>,
    pub recents: Vec<SavedPlaceView>,
    pub nearby: NearbyView,
    pub is_locating: bool,
    pub selection_pending: bool,
    pub location_denied: bool,
    pub dark_mode: bool,
    pub toast: Option<ToastView>,
}

fn join_nonempty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate_label(name: &str) -> String {
    if name.chars().count() <= REFERENCE_LABEL_CHARS {
        return name.to_string();
    }
    let head: String = name.chars().take(REFERENCE_LABEL_CHARS).collect();
    format!("{head}...")
}

fn coordinates_label(point: GeoPoint) -> String {
    let lat = point.lat();
    let lng = point.lng();
    format!(
        "{:.5}°{}, {:.5}°{}",
        lat.abs(),
        if lat >= 0.0 { 'N' } else { 'S' },
        lng.abs(),
        if lng >= 0.0 { 'E' } else { 'W' },
    )
}

fn search_view(model: &Model, config: &CoreConfig) -> SearchView {
    let search = &model.search;
    let text = search.text().to_string();
    let no_results_message = (search.show_suggestions()
        && search.no_results()
        && text.trim().chars().count() >= config.min_query_chars)
        .then(|| format!("No locations found for \u{201c}{}\u{201d}", text.trim()));

    SearchView {
        suggestions: search
            .suggestions()
            .iter()
            .map(|p| SuggestionView {
                name: p.name.clone(),
                detail: join_nonempty([p.city.as_str(), p.state.as_str(), p.country.as_str()]),
            })
            .collect(),
        show_suggestions: search.show_suggestions(),
        no_results_message,
        is_submitting: search.is_submitting(),
        text,
    }
}

fn place_view(place: &Place, model: &Model, config: &CoreConfig) -> PlaceView {
    let distance = distance_from_reference(
        model.reference_point.as_ref(),
        Some(place.point),
        config.coordinate_tolerance_deg,
    )
    .zip(model.reference_point.as_ref())
    .map(|(meters, reference)| DistanceView {
        meters,
        text: format_distance(meters),
        from_label: truncate_label(&reference.name),
    });

    PlaceView {
        name: place.name.clone(),
        country: place.country.clone(),
        city: place.city.clone(),
        state: place.state.clone(),
        address: place.address.clone(),
        postcode: place.postcode.clone(),
        lat: place.point.lat(),
        lng: place.point.lng(),
        coordinates_label: coordinates_label(place.point),
        coordinates_text: place.point.coordinates_text(),
        share_url: share_url(&config.share_url, place.point, config.share_zoom),
        is_favorited: model.history.is_favorited(place.point),
        is_search_result: model.location.has_override(),
        distance,
        weather: model.weather.current().map(WeatherView::from),
    }
}

fn nearby_view(model: &Model) -> NearbyView {
    let nearby = &model.nearby;
    let active = nearby.category();
    NearbyView {
        categories: NearbyCategory::ALL
            .into_iter()
            .map(|category| CategoryView {
                category,
                label: category.label().to_string(),
                active: active == Some(category),
            })
            .collect(),
        radii: SearchRadius::ALL
            .into_iter()
            .map(|radius| RadiusView {
                radius,
                label: radius.label(),
                active: radius == nearby.radius(),
            })
            .collect(),
        places: nearby.places().iter().map(NearbyPlaceView::from).collect(),
        is_loading: nearby.is_loading(),
        show_empty: active.is_some() && !nearby.is_loading() && nearby.places().is_empty(),
    }
}

#[must_use]
pub fn build(model: &Model, config: &CoreConfig) -> ViewModel {
    let current = model.current_place();

    let info_panel = match current {
        Some(place) => InfoPanel::Place(Box::new(place_view(place, model, config))),
        None if model.device_lookup == DeviceLookup::Pending || model.is_locating => {
            InfoPanel::Loading
        }
        None => InfoPanel::Empty,
    };

    ViewModel {
        search: search_view(model, config),
        info_panel,
        map_center: model.map_center(),
        marker: current.map(|p| MarkerView {
            point: p.point,
            label: p.name.clone(),
        }),
        reference_label: model
            .reference_point
            .as_ref()
            .map(|r| truncate_label(&r.name)),
        favorites: model
            .history
            .favorites()
            .iter()
            .map(|f| SavedPlaceView {
                name: f.name.clone(),
                detail: if f.country.is_empty() {
                    format!("{:.3}, {:.3}", f.lat, f.lng)
                } else {
                    f.country.clone()
                },
            })
            .collect(),
        recents: model
            .history
            .recents()
            .iter()
            .map(|r| SavedPlaceView {
                name: r.name.clone(),
                detail: format!("{:.3}, {:.3}", r.lat, r.lng),
            })
            .collect(),
        nearby: nearby_view(model),
        is_locating: model.is_locating,
        selection_pending: model.selection_pending,
        location_denied: model.location_permission.is_denied(),
        dark_mode: model.dark_mode,
        toast: model.active_toast.as_ref().map(ToastView::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReferencePoint, SearchResult};

    fn paris() -> Place {
        Place {
            city: "Paris".into(),
            country: "France".into(),
            ..Place::named("Paris", GeoPoint::new(48.8566, 2.3522).unwrap())
        }
    }

    #[test]
    fn test_empty_model_shows_empty_panel() {
        let view = build(&Model::default(), &CoreConfig::default());
        assert_eq!(view.info_panel, InfoPanel::Empty);
        assert!(view.marker.is_none());
        assert_eq!(view.nearby.categories.len(), 10);
        assert!(view.nearby.radii.iter().any(|r| r.active && r.label == "1.0 km"));
    }

    #[test]
    fn test_pending_lookup_shows_loading() {
        let mut model = Model::default();
        model.device_lookup = DeviceLookup::Pending;
        let view = build(&model, &CoreConfig::default());
        assert_eq!(view.info_panel, InfoPanel::Loading);
    }

    #[test]
    fn test_place_panel_fields() {
        let mut model = Model::default();
        model.location.set_override(SearchResult::single(paris()));
        let view = build(&model, &CoreConfig::default());

        let InfoPanel::Place(place) = view.info_panel else {
            panic!("expected place panel");
        };
        assert_eq!(place.coordinates_label, "48.85660°N, 2.35220°E");
        assert_eq!(place.coordinates_text, "48.856600, 2.352200");
        assert_eq!(
            place.share_url,
            "https://www.openstreetmap.org/?mlat=48.8566&mlon=2.3522&zoom=13"
        );
        assert!(place.is_search_result);
        assert!(place.distance.is_none());
    }

    #[test]
    fn test_distance_from_reference() {
        let mut model = Model::default();
        model.reference_point = Some(ReferencePoint {
            point: GeoPoint::new(51.5074, -0.1278).unwrap(),
            name: "London, Greater London, England".into(),
        });
        model.location.set_override(SearchResult::single(paris()));
        let view = build(&model, &CoreConfig::default());

        let InfoPanel::Place(place) = view.info_panel else {
            panic!("expected place panel");
        };
        let distance = place.distance.unwrap();
        assert!(distance.text.ends_with(" km"));
        assert_eq!(distance.from_label, "London, Greater Lond...");
    }

    #[test]
    fn test_weather_badge_text() {
        let view = WeatherView::from(&CurrentWeather {
            temperature: -0.4,
            windspeed: 12.5,
            weathercode: Some(3),
        });
        assert_eq!(view.temperature, "0°C");
        assert_eq!(view.wind, "Wind 12.5 km/h");
        assert_eq!(view.condition, WeatherCondition::PartlyCloudy);
    }

    #[test]
    fn test_no_results_message_needs_long_query() {
        use crate::capabilities::HttpResponse;

        let mut model = Model::default();
        model.search.input("zzzz".into());
        let generation = model.search.generation();
        model.search.apply_suggestions(
            generation,
            Ok(HttpResponse::ok_json(&serde_json::json!({"hits": []}), "v")),
        );
        let view = build(&model, &CoreConfig::default());
        assert_eq!(
            view.search.no_results_message.as_deref(),
            Some("No locations found for \u{201c}zzzz\u{201d}")
        );
    }
}
