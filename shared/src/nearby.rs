use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::capabilities::HttpResult;
use crate::geo::{format_distance, haversine_distance, GeoPoint};
use crate::model::{Place, SearchResult};
use crate::providers::{self, OverpassElement, ProviderError};
use crate::NEARBY_RESULT_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearbyCategory {
    Restaurant,
    Cafe,
    Hospital,
    Pharmacy,
    School,
    Bank,
    Fuel,
    Park,
    Atm,
    Supermarket,
}

impl NearbyCategory {
    pub const ALL: [NearbyCategory; 10] = [
        Self::Restaurant,
        Self::Cafe,
        Self::Hospital,
        Self::Pharmacy,
        Self::School,
        Self::Bank,
        Self::Fuel,
        Self::Park,
        Self::Atm,
        Self::Supermarket,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Cafe => "cafe",
            Self::Hospital => "hospital",
            Self::Pharmacy => "pharmacy",
            Self::School => "school",
            Self::Bank => "bank",
            Self::Fuel => "fuel",
            Self::Park => "park",
            Self::Atm => "atm",
            Self::Supermarket => "supermarket",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Restaurant => "Restaurants",
            Self::Cafe => "Cafes",
            Self::Hospital => "Hospitals",
            Self::Pharmacy => "Pharmacy",
            Self::School => "Schools",
            Self::Bank => "Banks",
            Self::Fuel => "Fuel",
            Self::Park => "Parks",
            Self::Atm => "ATMs",
            Self::Supermarket => "Markets",
        }
    }

    /// OSM tag predicate as `(key, value)`.
    #[must_use]
    pub const fn tag(self) -> (&'static str, &'static str) {
        match self {
            Self::Park => ("leisure", "park"),
            Self::Supermarket => ("shop", "supermarket"),
            other => ("amenity", other.id()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SearchRadius {
    M500,
    #[default]
    M1000,
    M2000,
    M5000,
}

impl SearchRadius {
    pub const ALL: [SearchRadius; 4] = [Self::M500, Self::M1000, Self::M2000, Self::M5000];

    #[must_use]
    pub const fn meters(self) -> u32 {
        match self {
            Self::M500 => 500,
            Self::M1000 => 1000,
            Self::M2000 => 2000,
            Self::M5000 => 5000,
        }
    }

    #[must_use]
    pub fn label(self) -> String {
        format_distance(f64::from(self.meters()))
    }
}

impl TryFrom<u32> for SearchRadius {
    type Error = String;

    fn try_from(meters: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|r| r.meters() == meters)
            .ok_or_else(|| format!("unsupported radius {meters} m"))
    }
}

impl From<SearchRadius> for u32 {
    fn from(radius: SearchRadius) -> Self {
        radius.meters()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPlace {
    pub id: Option<u64>,
    pub name: String,
    pub point: GeoPoint,
    pub distance_m: f64,
    pub opening_hours: Option<String>,
    pub tags: HashMap<String, String>,
}

impl NearbyPlace {
    fn tag(&self, key: &str) -> String {
        self.tags.get(key).cloned().unwrap_or_default()
    }

    /// Builds the selection directly from the element's tags; no geocoder call.
    #[must_use]
    pub fn to_search_result(&self) -> SearchResult {
        let street = self.tag("addr:street");
        let housenumber = self.tag("addr:housenumber");
        let address = [street.trim(), housenumber.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        SearchResult::single(Place {
            name: self.name.clone(),
            point: self.point,
            country: self.tag("addr:country"),
            city: self.tag("addr:city"),
            state: self.tag("addr:state"),
            address,
            postcode: self.tag("addr:postcode"),
        })
    }
}

/// Drops elements without usable coordinates, measures the rest from `center`,
/// sorts nearest first and keeps `limit`.
#[must_use]
pub fn rank_elements(
    elements: Vec<OverpassElement>,
    center: GeoPoint,
    category: NearbyCategory,
    limit: usize,
) -> Vec<NearbyPlace> {
    let mut places: Vec<NearbyPlace> = elements
        .into_iter()
        .filter_map(|element| {
            let point = GeoPoint::new(element.lat?, element.lon?).ok()?;
            let name = element
                .tags
                .get("name")
                .filter(|n| !n.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| category.label().to_string());
            Some(NearbyPlace {
                id: element.id,
                name,
                point,
                distance_m: haversine_distance(center, point),
                opening_hours: element.tags.get("opening_hours").cloned(),
                tags: element.tags,
            })
        })
        .collect();

    places.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    places.truncate(limit);
    places
}

#[derive(Debug, Clone, PartialEq)]
pub enum NearbyOutcome {
    Stale,
    Found(usize),
    /// Nothing qualified; carries the toast text.
    Empty(String),
    Failed(ProviderError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingLookup {
    category: NearbyCategory,
    radius: SearchRadius,
    center: GeoPoint,
}

#[derive(Debug, Clone)]
pub struct NearbyState {
    radius: SearchRadius,
    category: Option<NearbyCategory>,
    places: Vec<NearbyPlace>,
    loading: bool,
    generation: u64,
    pending: Option<PendingLookup>,
    result_limit: usize,
}

impl Default for NearbyState {
    fn default() -> Self {
        Self::new(NEARBY_RESULT_LIMIT)
    }
}

impl NearbyState {
    #[must_use]
    pub fn new(result_limit: usize) -> Self {
        Self {
            radius: SearchRadius::default(),
            category: None,
            places: Vec::new(),
            loading: false,
            generation: 0,
            pending: None,
            result_limit,
        }
    }

    #[must_use]
    pub fn radius(&self) -> SearchRadius {
        self.radius
    }

    pub fn set_radius(&mut self, radius: SearchRadius) {
        self.radius = radius;
    }

    pub fn set_result_limit(&mut self, result_limit: usize) {
        self.result_limit = result_limit;
    }

    #[must_use]
    pub fn category(&self) -> Option<NearbyCategory> {
        self.category
    }

    #[must_use]
    pub fn places(&self) -> &[NearbyPlace] {
        &self.places
    }

    #[must_use]
    pub fn place_at(&self, index: usize) -> Option<&NearbyPlace> {
        self.places.get(index)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Starts a lookup and returns its generation. Previous results are cleared.
    pub fn begin(&mut self, category: NearbyCategory, center: GeoPoint) -> u64 {
        self.generation += 1;
        self.category = Some(category);
        self.places.clear();
        self.loading = true;
        self.pending = Some(PendingLookup {
            category,
            radius: self.radius,
            center,
        });
        self.generation
    }

    pub fn apply(&mut self, generation: u64, result: HttpResult) -> NearbyOutcome {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale nearby response");
            return NearbyOutcome::Stale;
        }
        self.loading = false;
        let Some(PendingLookup {
            category,
            radius,
            center,
        }) = self.pending.take()
        else {
            return NearbyOutcome::Stale;
        };

        match providers::parse_overpass(result) {
            Ok(elements) => {
                self.places = rank_elements(elements, center, category, self.result_limit);
                if self.places.is_empty() {
                    NearbyOutcome::Empty(format!(
                        "No {} found within {}",
                        category.label().to_lowercase(),
                        radius.label()
                    ))
                } else {
                    NearbyOutcome::Found(self.places.len())
                }
            }
            Err(e) => NearbyOutcome::Failed(e),
        }
    }

    /// Leaves the lookup that was just started unanswered.
    pub fn abort(&mut self) {
        self.loading = false;
        self.pending = None;
    }
}
