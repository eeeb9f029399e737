//! Effects the core asks the shell to perform.
//!
//! HTTP, storage and rendering come from the Crux capability crates; device
//! position and debounce delays are defined here. The `Effect` derive turns
//! the set into the `Effect` enum the shell matches on.

mod geolocation;
mod http;
mod kv;
mod timer;

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult, Position,
    PositionOptions,
};
pub use self::http::{HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResult, ValidatedUrl};
pub use self::kv::{KvError, KvResult, StorageSlot};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub geolocation: Geolocation<Event>,
    pub timer: Timer<Event>,
    pub render: Render<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crux_core::testing::AppTester;

    #[test]
    fn test_effects_keep_request_order() {
        let app = AppTester::<App, Effect>::default();
        let mut model = crate::Model::default();

        let update = app.update(Event::DarkModeToggled, &mut model);
        let effects: Vec<_> = update.into_effects().collect();
        assert_eq!(effects.len(), 2);
        assert!(effects[0].is_kv());
        assert!(effects[1].is_render());
    }

    #[test]
    fn test_timer_resolves_to_event() {
        let app = AppTester::<App, Effect>::default();
        let mut model = crate::Model::default();

        let update = app.update(Event::SearchInputChanged("par".into()), &mut model);
        let mut request = update
            .into_effects()
            .find_map(Effect::into_timer)
            .expect("debounce timer");
        assert_eq!(request.operation, TimerOperation::Delay { millis: 280 });

        let update = app
            .resolve(&mut request, TimerOutput::Elapsed)
            .expect("timer resolves");
        assert!(matches!(
            update.events.as_slice(),
            [Event::SearchDebounceElapsed { generation: 1 }]
        ));
    }
}
