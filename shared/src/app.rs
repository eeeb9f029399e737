use crate::capabilities::{
    Capabilities, GeolocationError, GeolocationResult, HttpRequest, HttpResult, KvResult,
    PositionOptions, StorageSlot,
};
use crate::event::{Event, SelectionSource};
use crate::geo::GeoPoint;
use crate::history::FavoriteToggle;
use crate::model::{
    DeviceLookup, FavoriteEntry, Model, PermissionState, Place, RecentEntry, ReferencePoint,
    SearchResult, ToastKind,
};
use crate::nearby::{NearbyCategory, NearbyOutcome};
use crate::providers;
use crate::search::{InputOutcome, SubmitAction, SubmitOutcome};
use crate::view::{self, ViewModel};
use crate::AppError;

const NO_LOCATION_SELECTED: &str = "No location selected";
const NEARBY_FAILED: &str = "Failed to fetch nearby places";
const SELECTION_FAILED: &str = "Couldn't load that saved place. Please try again.";

/// The event loop. Stateless; settings and session state live in [`Model`].
#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        let _span = tracing::debug_span!("update", event = event_name).entered();

        if event.is_user_initiated() {
            tracing::info!(event = event_name, "user action");
        } else {
            tracing::debug!(event = event_name, "event received");
        }

        match event {
            // Lifecycle
            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    tracing::debug!(geocoder = %config.geocoder_url, "settings applied");
                    model.apply_config(*config);
                }
                Err(e) => {
                    let error = AppError::from(e);
                    tracing::warn!(code = error.code(), error = %error, "settings rejected, keeping current ones");
                }
            },

            Event::Startup => {
                for slot in StorageSlot::ALL {
                    slot.read(&caps.kv, move |result| Event::StorageLoaded { slot, result });
                }

                model.device_lookup = DeviceLookup::Pending;
                if model.location_permission == PermissionState::Unknown {
                    model.location_permission = PermissionState::Requesting;
                }
                caps.geolocation
                    .current_position(PositionOptions::default(), Event::DevicePositionResolved);

                caps.render.render();
            }

            Event::StorageLoaded { slot, result } => {
                Self::handle_storage_loaded(slot, result, model, caps);
                caps.render.render();
            }

            Event::StorageWritten { slot, result } => match result {
                Ok(_) => tracing::debug!(slot = slot.key(), "slot persisted"),
                Err(e) => {
                    let error = AppError::from(e);
                    tracing::warn!(slot = slot.key(), code = error.code(), error = %error, "persist failed");
                }
            },

            Event::DevicePositionResolved(result) => {
                Self::handle_device_position(result, model, caps);
                caps.render.render();
            }

            Event::DevicePlaceResolved { point, result } => {
                model.device_lookup = DeviceLookup::Done;
                match providers::parse_reverse_geocode(result) {
                    Ok(place) => {
                        let previous = model.current_point();
                        model.location.device_resolved(place);
                        Self::location_changed(previous, model, caps);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, lat = point.lat(), lng = point.lng(), "device reverse lookup failed");
                    }
                }
                caps.render.render();
            }

            // Search
            Event::SearchInputChanged(text) => {
                match model.search.input(text) {
                    InputOutcome::Cleared => {}
                    InputOutcome::Debounce { generation } => {
                        caps.timer.delay(model.config.search_debounce_ms, move |_| {
                            Event::SearchDebounceElapsed { generation }
                        });
                    }
                }
                caps.render.render();
            }

            Event::SearchDebounceElapsed { generation } => {
                let Some(query) = model.search.debounce_elapsed(generation) else {
                    tracing::debug!(generation, "stale debounce dropped");
                    return;
                };
                match providers::geocode_request(&model.config, &query) {
                    Ok(request) => request.send(&caps.http, move |result| {
                        Event::SuggestionsReceived { generation, result }
                    }),
                    Err(e) => tracing::warn!(error = %e, "could not build geocode request"),
                }
            }

            Event::SuggestionsReceived { generation, result } => {
                if model.search.apply_suggestions(generation, result) {
                    caps.render.render();
                }
            }

            Event::SearchSubmitted => {
                match model.search.submit() {
                    SubmitAction::Ignore => {}
                    SubmitAction::Select(result) => Self::apply_search_result(result, model, caps),
                    SubmitAction::Fetch { generation, query } => {
                        match providers::geocode_request(&model.config, &query) {
                            Ok(request) => request.send(&caps.http, move |result| {
                                Event::SearchSubmitResponse {
                                    generation,
                                    query,
                                    result,
                                }
                            }),
                            Err(e) => {
                                model.search.clear();
                                Self::show_error(model, AppError::from(e));
                            }
                        }
                    }
                }
                caps.render.render();
            }

            Event::SearchSubmitResponse {
                generation,
                query,
                result,
            } => {
                match model.search.apply_submit(generation, query, result) {
                    SubmitOutcome::Stale => return,
                    SubmitOutcome::Found(result) => Self::apply_search_result(result, model, caps),
                    SubmitOutcome::NoResults => {
                        tracing::info!("search returned no results");
                    }
                    SubmitOutcome::Failed(e) => {
                        tracing::warn!(error = %e, "search failed");
                        Self::show_error(model, AppError::from(e));
                    }
                }
                caps.render.render();
            }

            Event::SuggestionSelected(index) => {
                if let Some(result) = model.search.select(index) {
                    Self::apply_search_result(result, model, caps);
                }
                caps.render.render();
            }

            Event::SearchCleared => {
                model.search.clear();
                caps.render.render();
            }

            Event::SuggestionsFocused => {
                model.search.focus();
                caps.render.render();
            }

            Event::SuggestionsDismissed => {
                model.search.dismiss();
                caps.render.render();
            }

            // Locate me
            Event::LocateRequested => {
                model.is_locating = true;
                if model.location_permission != PermissionState::Granted {
                    model.location_permission = PermissionState::Requesting;
                }
                caps.geolocation.current_position(
                    PositionOptions::high_accuracy(model.config.locate_timeout_ms),
                    Event::LocatePositionResolved,
                );
                caps.render.render();
            }

            Event::LocatePositionResolved(result) => {
                Self::handle_locate_position(result, model, caps);
                caps.render.render();
            }

            Event::LocatePlaceResolved { point, result } => {
                let place = match providers::parse_reverse_geocode(result) {
                    Ok(place) => place.with_point(point),
                    Err(e) => {
                        tracing::info!(error = %e, "reverse lookup failed, labelling fix by coordinates");
                        Place::from_coordinates(point)
                    }
                };
                Self::apply_locate(place, model, caps);
                caps.render.render();
            }

            // History
            Event::FavoriteToggled => {
                let Some(place) = model.current_place() else {
                    return;
                };
                let entry = FavoriteEntry::from_place(place);
                match model.history.toggle_favorite(entry) {
                    FavoriteToggle::Added => model.show_toast("Added to favorites", ToastKind::Success),
                    FavoriteToggle::Removed => model.show_toast("Removed from favorites", ToastKind::Info),
                }
                Self::persist(StorageSlot::Favorites, model, caps);
                caps.render.render();
            }

            Event::FavoriteSelected(index) => {
                let point = model.history.favorite_at(index).map(FavoriteEntry::point);
                Self::request_selection(SelectionSource::Favorite, point, model, caps);
                caps.render.render();
            }

            Event::RecentSelected(index) => {
                let point = model.history.recent_at(index).map(RecentEntry::point);
                Self::request_selection(SelectionSource::Recent, point, model, caps);
                caps.render.render();
            }

            Event::SelectionPlaceResolved {
                source,
                point,
                result,
            } => {
                model.selection_pending = false;
                match providers::parse_reverse_geocode(result) {
                    Ok(place) => {
                        let result = SearchResult::single(place.with_point(point));
                        Self::apply_override(result, model, caps);
                    }
                    Err(e) => {
                        tracing::warn!(?source, error = %e, "saved place lookup failed");
                        model.show_toast(SELECTION_FAILED, ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            Event::FavoriteDeleted(index) => {
                if let Some(removed) = model.history.remove_favorite_at(index) {
                    tracing::debug!(name = %removed.name, "favorite deleted");
                    model.show_toast(format!("Removed {} from favorites", removed.name), ToastKind::Info);
                    Self::persist(StorageSlot::Favorites, model, caps);
                }
                caps.render.render();
            }

            Event::FavoritesCleared => {
                let count = model.history.clear_favorites();
                if count > 0 {
                    model.show_toast("Favorites cleared", ToastKind::Success);
                    Self::persist(StorageSlot::Favorites, model, caps);
                }
                caps.render.render();
            }

            // Nearby
            Event::NearbyRadiusChanged(radius) => {
                model.nearby.set_radius(radius);
                caps.render.render();
            }

            Event::NearbyCategorySelected(category) => {
                Self::start_nearby(category, model, caps);
                caps.render.render();
            }

            Event::NearbyResponse { generation, result } => {
                match model.nearby.apply(generation, result) {
                    NearbyOutcome::Stale => return,
                    NearbyOutcome::Found(count) => tracing::debug!(count, "nearby places loaded"),
                    NearbyOutcome::Empty(message) => model.show_toast(message, ToastKind::Info),
                    NearbyOutcome::Failed(e) => {
                        tracing::warn!(error = %e, "nearby lookup failed");
                        model.show_toast(NEARBY_FAILED, ToastKind::Error);
                    }
                }
                caps.render.render();
            }

            Event::NearbyPlaceSelected(index) => {
                if let Some(place) = model.nearby.place_at(index) {
                    let result = place.to_search_result();
                    Self::apply_override(result, model, caps);
                }
                caps.render.render();
            }

            // Weather
            Event::WeatherResponse { generation, result } => {
                if model.weather.apply(generation, result) {
                    caps.render.render();
                }
            }

            // Map and info panel
            Event::MapMoved(center) => {
                model.map_focus = Some(center);
                caps.render.render();
            }

            Event::ReferencePointSet => {
                let Some(reference) = model.current_place().map(|place| ReferencePoint {
                    point: place.point,
                    name: place.name.clone(),
                }) else {
                    return;
                };
                model.reference_point = Some(reference);
                model.show_toast(
                    "Point A set. Search another location to measure distance.",
                    ToastKind::Info,
                );
                caps.render.render();
            }

            Event::ReferencePointCleared => {
                model.reference_point = None;
                caps.render.render();
            }

            Event::CoordinatesCopied => {
                if model.current_place().is_some() {
                    model.show_toast("Coordinates copied!", ToastKind::Success);
                    caps.render.render();
                }
            }

            Event::LocationShared => {
                if model.current_place().is_some() {
                    model.show_toast("Location link copied to clipboard!", ToastKind::Success);
                    caps.render.render();
                }
            }

            // Preferences and UI
            Event::DarkModeToggled => {
                model.dark_mode = !model.dark_mode;
                Self::persist(StorageSlot::DarkMode, model, caps);
                caps.render.render();
            }

            Event::ToastDismissed => {
                model.clear_toast();
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model, &model.config)
    }
}

impl App {

    fn handle_storage_loaded(slot: StorageSlot, result: KvResult, model: &mut Model, caps: &Capabilities) {
        let stored = match result {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(slot = slot.key(), error = %e, "slot unreadable, starting empty");
                return;
            }
        };

        match slot {
            StorageSlot::Favorites => match slot.decode::<Vec<FavoriteEntry>>(stored) {
                Ok(Some(stored)) => {
                    let had_session_entries = !model.history.favorites().is_empty();
                    model.history.hydrate_favorites(stored);
                    if had_session_entries {
                        Self::persist(slot, model, caps);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(slot = slot.key(), error = %e, "corrupt slot ignored"),
            },
            StorageSlot::RecentSearches => match slot.decode::<Vec<RecentEntry>>(stored) {
                Ok(Some(stored)) => {
                    let had_session_entries = !model.history.recents().is_empty();
                    model.history.hydrate_recents(stored);
                    if had_session_entries {
                        Self::persist(slot, model, caps);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(slot = slot.key(), error = %e, "corrupt slot ignored"),
            },
            StorageSlot::DarkMode => match slot.decode::<bool>(stored) {
                Ok(Some(dark)) => model.dark_mode = dark,
                Ok(None) => {}
                Err(e) => tracing::warn!(slot = slot.key(), error = %e, "corrupt slot ignored"),
            },
        }
    }

    fn handle_device_position(result: GeolocationResult, model: &mut Model, caps: &Capabilities) {
        let position = match result {
            Ok(position) => position,
            Err(e) => {
                model.device_lookup = DeviceLookup::Done;
                if matches!(e, GeolocationError::PermissionDenied) {
                    model.location_permission = PermissionState::Denied;
                }
                tracing::info!(error = %e, "no device position at startup");
                return;
            }
        };

        model.location_permission = PermissionState::Granted;
        let point = match position.point() {
            Ok(point) => point,
            Err(e) => {
                model.device_lookup = DeviceLookup::Done;
                tracing::warn!(error = %e, "device reported an invalid position");
                return;
            }
        };

        match providers::reverse_geocode_request(&model.config, point) {
            Ok(request) => request.send(&caps.http, move |result| Event::DevicePlaceResolved { point, result }),
            Err(e) => {
                model.device_lookup = DeviceLookup::Done;
                tracing::warn!(error = %e, "could not build reverse geocode request");
            }
        }
    }

    fn handle_locate_position(result: GeolocationResult, model: &mut Model, caps: &Capabilities) {
        let position = match result {
            Ok(position) => position,
            Err(e) => {
                model.is_locating = false;
                if matches!(e, GeolocationError::PermissionDenied) {
                    model.location_permission = PermissionState::Denied;
                }
                tracing::info!(error = %e, "locate failed");
                Self::show_error(model, AppError::from(e));
                return;
            }
        };

        model.location_permission = PermissionState::Granted;
        let point = match position.point() {
            Ok(point) => point,
            Err(e) => {
                model.is_locating = false;
                Self::show_error(model, AppError::from(GeolocationError::PositionUnavailable {
                    reason: e.to_string(),
                }));
                return;
            }
        };

        // The override goes now; the map jumps to the raw fix while the name resolves.
        model.location.clear_override();
        model.weather.reset();
        model.map_focus = Some(point);

        match providers::reverse_geocode_request(&model.config, point) {
            Ok(request) => {
                request.send(&caps.http, move |result| Event::LocatePlaceResolved { point, result });
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not build reverse geocode request");
                Self::apply_locate(Place::from_coordinates(point), model, caps);
            }
        }
    }

    fn apply_locate(place: Place, model: &mut Model, caps: &Capabilities) {
        model.is_locating = false;
        let previous = model.current_point();
        model.location.locate_resolved(place);
        Self::location_changed(previous, model, caps);
    }

    fn request_selection(
        source: SelectionSource,
        point: Option<Result<GeoPoint, crate::CoordinateError>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let point = match point {
            None => return,
            Some(Ok(point)) => point,
            Some(Err(e)) => {
                tracing::warn!(?source, error = %e, "saved entry has invalid coordinates");
                model.show_toast(SELECTION_FAILED, ToastKind::Error);
                return;
            }
        };

        match providers::reverse_geocode_request(&model.config, point) {
            Ok(request) => {
                model.selection_pending = true;
                request.send(&caps.http, move |result| Event::SelectionPlaceResolved {
                    source,
                    point,
                    result,
                });
            }
            Err(e) => Self::show_error(model, AppError::from(e)),
        }
    }

    fn start_nearby(category: NearbyCategory, model: &mut Model, caps: &Capabilities) {
        let Some(center) = model.map_center() else {
            model.show_toast(NO_LOCATION_SELECTED, ToastKind::Error);
            return;
        };

        let radius = model.nearby.radius();
        let generation = model.nearby.begin(category, center);
        let request = providers::overpass_request(&model.config, category, radius, center);
        match request {
            Ok(request) => {
                request.send(&caps.http, move |result| Event::NearbyResponse { generation, result });
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not build nearby request");
                model.nearby.abort();
                model.show_toast(NEARBY_FAILED, ToastKind::Error);
            }
        }
    }

    /// A completed search: remember it, then make it the current location.
    fn apply_search_result(result: SearchResult, model: &mut Model, caps: &Capabilities) {
        model.history.add_recent(RecentEntry::from_place(result.primary()));
        Self::persist(StorageSlot::RecentSearches, model, caps);
        Self::apply_override(result, model, caps);
    }

    fn apply_override(result: SearchResult, model: &mut Model, caps: &Capabilities) {
        let previous = model.current_point();
        model.location.set_override(result);
        Self::location_changed(previous, model, caps);
    }

    /// Called after every write to the authoritative location. The map
    /// follows the new place and the weather badge is refreshed when the
    /// point actually moved.
    fn location_changed(previous: Option<GeoPoint>, model: &mut Model, caps: &Capabilities) {
        model.map_focus = None;
        let current = model.current_point();
        if current == previous {
            return;
        }

        let Some(point) = current else {
            model.weather.reset();
            return;
        };
        let generation = model.weather.begin();
        match providers::weather_request(&model.config, point) {
            Ok(request) => Self::send_weather(request, generation, caps),
            Err(e) => tracing::warn!(error = %e, "could not build weather request"),
        }
    }

    fn send_weather(request: HttpRequest, generation: u64, caps: &Capabilities) {
        request.send(&caps.http, move |result: HttpResult| Event::WeatherResponse {
            generation,
            result,
        });
    }

    fn persist(slot: StorageSlot, model: &Model, caps: &Capabilities) {
        let encoded = match slot {
            StorageSlot::Favorites => slot.encode(model.history.favorites()),
            StorageSlot::RecentSearches => slot.encode(model.history.recents()),
            StorageSlot::DarkMode => slot.encode(&model.dark_mode),
        };

        match encoded {
            Ok(value) => slot.write(&caps.kv, value, move |result| Event::StorageWritten { slot, result }),
            Err(e) => {
                let error = AppError::from(e);
                tracing::warn!(slot = slot.key(), code = error.code(), error = %error, "slot not persisted");
            }
        }
    }

    fn show_error(model: &mut Model, error: AppError) {
        tracing::debug!(code = error.code(), error = %error, "surfacing error");
        model.show_toast(error.user_facing_message(), ToastKind::Error);
    }
}
