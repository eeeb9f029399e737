//! Debounced query-to-suggestions pipeline.
//!
//! Every keystroke, submit, selection and clear bumps one generation counter.
//! A debounce timer or geocoder response carries the generation it was issued
//! under and is dropped on arrival if the counter has moved on, so only the
//! most recently issued request can touch the visible suggestions.

use crate::capabilities::HttpResult;
use crate::model::{Place, SearchResult};
use crate::providers::{self, ProviderError};
use crate::MIN_QUERY_CHARS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Too short: suggestions were cleared and no request will be made.
    Cleared,
    /// Start a debounce delay tagged with this generation.
    Debounce { generation: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAction {
    Ignore,
    /// Cached suggestions existed; the first one was picked as if clicked.
    Select(SearchResult),
    Fetch { generation: u64, query: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Stale,
    Found(SearchResult),
    NoResults,
    Failed(ProviderError),
}

#[derive(Debug, Clone)]
pub struct SearchController {
    text: String,
    suggestions: Vec<Place>,
    show_suggestions: bool,
    no_results: bool,
    submitting: bool,
    generation: u64,
    min_chars: usize,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(MIN_QUERY_CHARS)
    }
}

impl SearchController {
    #[must_use]
    pub fn new(min_chars: usize) -> Self {
        Self {
            text: String::new(),
            suggestions: Vec::new(),
            show_suggestions: false,
            no_results: false,
            submitting: false,
            generation: 0,
            min_chars,
        }
    }

    pub fn set_min_chars(&mut self, min_chars: usize) {
        self.min_chars = min_chars;
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn suggestions(&self) -> &[Place] {
        &self.suggestions
    }

    #[must_use]
    pub fn show_suggestions(&self) -> bool {
        self.show_suggestions
    }

    /// True when the last completed lookup for the current text found nothing.
    #[must_use]
    pub fn no_results(&self) -> bool {
        self.no_results
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn is_long_enough(&self, text: &str) -> bool {
        text.chars().count() >= self.min_chars
    }

    pub fn input(&mut self, text: String) -> InputOutcome {
        let generation = self.bump();
        self.no_results = false;
        self.text = text;

        if self.is_long_enough(&self.text) {
            InputOutcome::Debounce { generation }
        } else {
            self.suggestions.clear();
            self.show_suggestions = false;
            InputOutcome::Cleared
        }
    }

    /// The query to send if the delay is still current.
    #[must_use]
    pub fn debounce_elapsed(&self, generation: u64) -> Option<String> {
        (generation == self.generation && self.is_long_enough(&self.text))
            .then(|| self.text.clone())
    }

    /// Returns `false` when the response was stale and ignored.
    pub fn apply_suggestions(&mut self, generation: u64, result: HttpResult) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale suggestions dropped");
            return false;
        }

        match providers::parse_geocode(result) {
            Ok(places) => {
                self.no_results = places.is_empty();
                self.suggestions = places;
                self.show_suggestions = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "suggestion lookup failed");
                self.suggestions.clear();
                self.show_suggestions = false;
                self.no_results = false;
            }
        }
        true
    }

    /// Any non-blank text can be submitted; the minimum length only gates
    /// the debounced suggestions in [`input`](Self::input).
    pub fn submit(&mut self) -> SubmitAction {
        let query = self.text.trim().to_string();
        if query.is_empty() {
            return SubmitAction::Ignore;
        }

        self.show_suggestions = false;
        if !self.suggestions.is_empty() {
            return self.select(0).map_or(SubmitAction::Ignore, SubmitAction::Select);
        }

        let generation = self.bump();
        self.submitting = true;
        self.no_results = false;
        SubmitAction::Fetch { generation, query }
    }

    pub fn apply_submit(&mut self, generation: u64, query: String, result: HttpResult) -> SubmitOutcome {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale submit response dropped");
            return SubmitOutcome::Stale;
        }
        self.submitting = false;

        match providers::parse_geocode(result) {
            Ok(places) => match SearchResult::new(places, query) {
                Some(found) => {
                    self.text = found.primary().name.clone();
                    self.suggestions = found.hits().to_vec();
                    self.no_results = false;
                    SubmitOutcome::Found(found)
                }
                None => {
                    self.suggestions.clear();
                    self.show_suggestions = true;
                    self.no_results = true;
                    SubmitOutcome::NoResults
                }
            },
            Err(e) => SubmitOutcome::Failed(e),
        }
    }

    /// Picks a suggestion as the new search result.
    pub fn select(&mut self, index: usize) -> Option<SearchResult> {
        let place = self.suggestions.get(index)?.clone();
        self.bump();
        self.text = place.name.clone();
        self.show_suggestions = false;
        self.no_results = false;
        self.submitting = false;
        Some(SearchResult::single(place))
    }

    pub fn clear(&mut self) {
        self.bump();
        self.text.clear();
        self.suggestions.clear();
        self.show_suggestions = false;
        self.no_results = false;
        self.submitting = false;
    }

    pub fn focus(&mut self) {
        if !self.suggestions.is_empty() {
            self.show_suggestions = true;
        }
    }

    pub fn dismiss(&mut self) {
        self.show_suggestions = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{HttpError, HttpResponse};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn hits(names: &[&str]) -> HttpResult {
        let hits: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"name": name, "point": {"lat": i as f64, "lng": 1.0}}))
            .collect();
        Ok(HttpResponse::ok_json(&json!({ "hits": hits }), "s"))
    }

    fn typed(controller: &mut SearchController, text: &str) -> InputOutcome {
        controller.input(text.to_string())
    }

    mod debounce_tests {
        use super::*;

        #[test]
        fn test_short_input_never_debounces() {
            let mut search = SearchController::default();
            assert_eq!(typed(&mut search, "a"), InputOutcome::Cleared);
            assert_eq!(typed(&mut search, "ab"), InputOutcome::Cleared);
            assert!(search.suggestions().is_empty());
        }

        #[test]
        fn test_length_counts_characters() {
            let mut search = SearchController::default();
            assert_eq!(typed(&mut search, "éé"), InputOutcome::Cleared);
            assert_matches!(typed(&mut search, "ééé"), InputOutcome::Debounce { .. });
        }

        #[test]
        fn test_only_latest_debounce_fires() {
            let mut search = SearchController::default();
            let InputOutcome::Debounce { generation: first } = typed(&mut search, "abc") else {
                panic!("expected debounce");
            };
            let InputOutcome::Debounce { generation: second } = typed(&mut search, "abcd") else {
                panic!("expected debounce");
            };
            assert_eq!(search.debounce_elapsed(first), None);
            assert_eq!(search.debounce_elapsed(second).as_deref(), Some("abcd"));
        }

        #[test]
        fn test_shortening_cancels_pending_debounce() {
            let mut search = SearchController::default();
            let InputOutcome::Debounce { generation } = typed(&mut search, "abc") else {
                panic!("expected debounce");
            };
            typed(&mut search, "ab");
            assert_eq!(search.debounce_elapsed(generation), None);
        }
    }

    mod suggestion_tests {
        use super::*;

        #[test]
        fn test_stale_response_is_discarded() {
            let mut search = SearchController::default();
            typed(&mut search, "paris");
            let paris_gen = search.generation();
            typed(&mut search, "london");
            let london_gen = search.generation();

            assert!(search.apply_suggestions(london_gen, hits(&["London"])));
            assert!(!search.apply_suggestions(paris_gen, hits(&["Paris"])));
            assert_eq!(search.suggestions()[0].name, "London");
        }

        #[test]
        fn test_failure_degrades_to_no_suggestions() {
            let mut search = SearchController::default();
            typed(&mut search, "paris");
            let generation = search.generation();
            search.apply_suggestions(
                generation,
                Err(HttpError::Timeout {
                    request_id: "s".into(),
                }),
            );
            assert!(search.suggestions().is_empty());
            assert!(!search.show_suggestions());
            assert!(!search.no_results());
        }

        #[test]
        fn test_empty_hits_flag_no_results() {
            let mut search = SearchController::default();
            typed(&mut search, "qqqqqq");
            let generation = search.generation();
            search.apply_suggestions(generation, hits(&[]));
            assert!(search.no_results());
            assert!(search.show_suggestions());
        }

        #[test]
        fn test_select_sets_text_and_hides() {
            let mut search = SearchController::default();
            typed(&mut search, "lou");
            let generation = search.generation();
            search.apply_suggestions(generation, hits(&["Louvre", "Lourdes"]));

            let result = search.select(1).unwrap();
            assert_eq!(result.primary().name, "Lourdes");
            assert_eq!(result.query(), "Lourdes");
            assert_eq!(search.text(), "Lourdes");
            assert!(!search.show_suggestions());
            assert!(search.select(7).is_none());
        }
    }

    mod submit_tests {
        use super::*;

        #[test]
        fn test_blank_submit_is_ignored() {
            let mut search = SearchController::default();
            typed(&mut search, "   ");
            assert_eq!(search.submit(), SubmitAction::Ignore);
        }

        #[test]
        fn test_submit_uses_cached_suggestion() {
            let mut search = SearchController::default();
            typed(&mut search, "rom");
            let generation = search.generation();
            search.apply_suggestions(generation, hits(&["Rome", "Romania"]));

            assert_matches!(search.submit(), SubmitAction::Select(r) if r.primary().name == "Rome");
        }

        #[test]
        fn test_submit_fetches_without_cache() {
            let mut search = SearchController::default();
            typed(&mut search, " berlin ");
            let SubmitAction::Fetch { generation, query } = search.submit() else {
                panic!("expected fetch");
            };
            assert_eq!(query, "berlin");
            assert!(search.is_submitting());

            let outcome = search.apply_submit(generation, query, hits(&["Berlin", "Berlin, NH"]));
            assert_matches!(outcome, SubmitOutcome::Found(ref r) if r.hits().len() == 2 && r.query() == "berlin");
            assert_eq!(search.text(), "Berlin");
            assert!(!search.is_submitting());
        }

        #[test]
        fn test_submit_with_no_hits() {
            let mut search = SearchController::default();
            typed(&mut search, "zzzzzz");
            let SubmitAction::Fetch { generation, query } = search.submit() else {
                panic!("expected fetch");
            };
            assert_eq!(search.apply_submit(generation, query, hits(&[])), SubmitOutcome::NoResults);
            assert!(search.no_results());
        }

        #[test]
        fn test_short_text_can_be_submitted() {
            let mut search = SearchController::default();
            assert_eq!(typed(&mut search, "NY"), InputOutcome::Cleared);
            assert_matches!(search.submit(), SubmitAction::Fetch { ref query, .. } if query == "NY");
        }

        #[test]
        fn test_submit_cancels_pending_debounce() {
            let mut search = SearchController::default();
            let InputOutcome::Debounce { generation } = typed(&mut search, "oslo") else {
                panic!("expected debounce");
            };
            search.submit();
            assert_eq!(search.debounce_elapsed(generation), None);
        }

        #[test]
        fn test_clear_resets_everything() {
            let mut search = SearchController::default();
            typed(&mut search, "rom");
            let generation = search.generation();
            search.apply_suggestions(generation, hits(&["Rome"]));
            search.clear();
            assert_eq!(search.text(), "");
            assert!(search.suggestions().is_empty());
            assert!(!search.apply_suggestions(generation, hits(&["Rome"])));
        }
    }
}
