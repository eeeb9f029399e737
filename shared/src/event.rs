use serde::{Deserialize, Serialize};

use crate::capabilities::{GeolocationResult, HttpResult, KvResult, StorageSlot};
use crate::config::CoreConfig;
use crate::geo::GeoPoint;
use crate::nearby::{NearbyCategory, SearchRadius};

/// Where a reverse-geocoded selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Favorite,
    Recent,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Event {
    // Lifecycle
    /// Replaces the runtime settings. Sent by the shell before `Startup`.
    Configure(Box<CoreConfig>),
    Startup,
    StorageLoaded {
        slot: StorageSlot,
        result: KvResult,
    },
    StorageWritten {
        slot: StorageSlot,
        result: KvResult,
    },
    DevicePositionResolved(GeolocationResult),
    DevicePlaceResolved {
        point: GeoPoint,
        result: HttpResult,
    },

    // Search
    SearchInputChanged(String),
    SearchDebounceElapsed {
        generation: u64,
    },
    SuggestionsReceived {
        generation: u64,
        result: HttpResult,
    },
    SearchSubmitted,
    SearchSubmitResponse {
        generation: u64,
        query: String,
        result: HttpResult,
    },
    SuggestionSelected(usize),
    SearchCleared,
    SuggestionsFocused,
    SuggestionsDismissed,

    // Locate me
    LocateRequested,
    LocatePositionResolved(GeolocationResult),
    LocatePlaceResolved {
        point: GeoPoint,
        result: HttpResult,
    },

    // History
    FavoriteToggled,
    FavoriteSelected(usize),
    FavoriteDeleted(usize),
    FavoritesCleared,
    RecentSelected(usize),
    SelectionPlaceResolved {
        source: SelectionSource,
        point: GeoPoint,
        result: HttpResult,
    },

    // Nearby
    NearbyRadiusChanged(SearchRadius),
    NearbyCategorySelected(NearbyCategory),
    NearbyResponse {
        generation: u64,
        result: HttpResult,
    },
    NearbyPlaceSelected(usize),

    // Weather
    WeatherResponse {
        generation: u64,
        result: HttpResult,
    },

    // Map and info panel
    MapMoved(GeoPoint),
    ReferencePointSet,
    ReferencePointCleared,
    CoordinatesCopied,
    LocationShared,

    // Preferences and UI
    DarkModeToggled,
    ToastDismissed,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::Startup => "startup",
            Self::StorageLoaded { .. } => "storage_loaded",
            Self::StorageWritten { .. } => "storage_written",
            Self::DevicePositionResolved(_) => "device_position_resolved",
            Self::DevicePlaceResolved { .. } => "device_place_resolved",
            Self::SearchInputChanged(_) => "search_input_changed",
            Self::SearchDebounceElapsed { .. } => "search_debounce_elapsed",
            Self::SuggestionsReceived { .. } => "suggestions_received",
            Self::SearchSubmitted => "search_submitted",
            Self::SearchSubmitResponse { .. } => "search_submit_response",
            Self::SuggestionSelected(_) => "suggestion_selected",
            Self::SearchCleared => "search_cleared",
            Self::SuggestionsFocused => "suggestions_focused",
            Self::SuggestionsDismissed => "suggestions_dismissed",
            Self::LocateRequested => "locate_requested",
            Self::LocatePositionResolved(_) => "locate_position_resolved",
            Self::LocatePlaceResolved { .. } => "locate_place_resolved",
            Self::FavoriteToggled => "favorite_toggled",
            Self::FavoriteSelected(_) => "favorite_selected",
            Self::FavoriteDeleted(_) => "favorite_deleted",
            Self::FavoritesCleared => "favorites_cleared",
            Self::RecentSelected(_) => "recent_selected",
            Self::SelectionPlaceResolved { .. } => "selection_place_resolved",
            Self::NearbyRadiusChanged(_) => "nearby_radius_changed",
            Self::NearbyCategorySelected(_) => "nearby_category_selected",
            Self::NearbyResponse { .. } => "nearby_response",
            Self::NearbyPlaceSelected(_) => "nearby_place_selected",
            Self::WeatherResponse { .. } => "weather_response",
            Self::MapMoved(_) => "map_moved",
            Self::ReferencePointSet => "reference_point_set",
            Self::ReferencePointCleared => "reference_point_cleared",
            Self::CoordinatesCopied => "coordinates_copied",
            Self::LocationShared => "location_shared",
            Self::DarkModeToggled => "dark_mode_toggled",
            Self::ToastDismissed => "toast_dismissed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::SearchInputChanged(_)
                | Self::SearchSubmitted
                | Self::SuggestionSelected(_)
                | Self::SearchCleared
                | Self::LocateRequested
                | Self::FavoriteToggled
                | Self::FavoriteSelected(_)
                | Self::FavoriteDeleted(_)
                | Self::FavoritesCleared
                | Self::RecentSelected(_)
                | Self::NearbyRadiusChanged(_)
                | Self::NearbyCategorySelected(_)
                | Self::NearbyPlaceSelected(_)
                | Self::MapMoved(_)
                | Self::ReferencePointSet
                | Self::ReferencePointCleared
                | Self::CoordinatesCopied
                | Self::LocationShared
                | Self::DarkModeToggled
        )
    }
}
