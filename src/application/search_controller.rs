// Search controller - Debounced location search-as-you-type
use serde::Serialize;
use std::time::Duration;

use crate::application::providers::ProviderError;
use crate::domain::location::LocationCandidate;

/// Queries shorter than this (after trimming) never reach the geocoder.
pub const MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTiming {
    pub debounce: Duration,
    pub blur_grace: Duration,
    pub max_suggestions: usize,
}

impl Default for SearchTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            blur_grace: Duration::from_millis(150),
            max_suggestions: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchPhase {
    Idle,
    Debouncing,
    Fetching,
    Suggested,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEffect {
    ScheduleDebounce { generation: u64, delay: Duration },
    Lookup { generation: u64, query: String, limit: usize },
    ScheduleBlurClear { generation: u64, delay: Duration },
}

/// What a form submission resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAction {
    /// Suggestions were showing; the first one was accepted.
    Select(LocationCandidate),
    /// No suggestions; resolve the text with a single-result lookup.
    Lookup(String),
    Ignore,
}

/// Never sleeps or performs I/O. Each transition returns at most one
/// [`SearchEffect`] tagged with its generation; effects from older
/// generations are ignored when they report back.
#[derive(Debug, Clone)]
pub struct SearchController {
    timing: SearchTiming,
    text: String,
    phase: SearchPhase,
    suggestions: Vec<LocationCandidate>,
    generation: u64,
    suppress_next_reaction: bool,
}

impl SearchController {
    pub fn new(timing: SearchTiming) -> Self {
        Self {
            timing,
            text: String::new(),
            phase: SearchPhase::Idle,
            suggestions: Vec::new(),
            generation: 0,
            suppress_next_reaction: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn suggestions(&self) -> &[LocationCandidate] {
        &self.suggestions
    }

    /// Text typed by the user.
    pub fn user_input(&mut self, text: impl Into<String>) -> Option<SearchEffect> {
        self.text = text.into();
        self.react_to_text_change()
    }

    /// Text set by the application (reverse geocode, accepted suggestion).
    /// Arms the one-shot suppression so no lookup is issued for it.
    pub fn set_text_programmatic(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.suppress_next_reaction = true;
        let effect = self.react_to_text_change();
        debug_assert!(effect.is_none());
    }

    fn react_to_text_change(&mut self) -> Option<SearchEffect> {
        self.supersede();
        self.suggestions.clear();

        if std::mem::take(&mut self.suppress_next_reaction) {
            tracing::debug!("search: programmatic text change, lookup suppressed");
            self.phase = SearchPhase::Idle;
            return None;
        }

        if self.text.trim().chars().count() < MIN_QUERY_CHARS {
            self.phase = SearchPhase::Idle;
            return None;
        }

        self.phase = SearchPhase::Debouncing;
        Some(SearchEffect::ScheduleDebounce {
            generation: self.generation,
            delay: self.timing.debounce,
        })
    }

    pub fn debounce_elapsed(&mut self, generation: u64) -> Option<SearchEffect> {
        if generation != self.generation || self.phase != SearchPhase::Debouncing {
            return None;
        }
        self.phase = SearchPhase::Fetching;
        Some(SearchEffect::Lookup {
            generation,
            query: self.text.trim().to_string(),
            limit: self.timing.max_suggestions,
        })
    }

    /// Returns `false` when the result belonged to a superseded query.
    pub fn lookup_completed(
        &mut self,
        generation: u64,
        result: Result<Vec<LocationCandidate>, ProviderError>,
    ) -> bool {
        if generation != self.generation || self.phase != SearchPhase::Fetching {
            tracing::debug!(generation, current = self.generation, "search: stale lookup ignored");
            return false;
        }

        match result {
            Ok(mut candidates) if !candidates.is_empty() => {
                candidates.truncate(self.timing.max_suggestions);
                self.suggestions = candidates;
                self.phase = SearchPhase::Suggested;
            }
            Ok(_) => {
                self.suggestions.clear();
                self.phase = SearchPhase::Idle;
            }
            Err(e) => {
                tracing::warn!("search: suggestion lookup failed: {}", e);
                self.suggestions.clear();
                self.phase = SearchPhase::Idle;
            }
        }
        true
    }

    /// Focus left the input. Suggestions survive the grace period so a click
    /// on one of them still lands.
    pub fn blur(&self) -> SearchEffect {
        SearchEffect::ScheduleBlurClear {
            generation: self.generation,
            delay: self.timing.blur_grace,
        }
    }

    pub fn blur_grace_elapsed(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.suggestions.clear();
        if self.phase == SearchPhase::Suggested {
            self.phase = SearchPhase::Idle;
        }
        true
    }

    pub fn select(&mut self, index: usize) -> Option<LocationCandidate> {
        let candidate = self.suggestions.get(index)?.clone();
        self.set_text_programmatic(candidate.name.clone());
        Some(candidate)
    }

    pub fn submit(&mut self) -> SubmitAction {
        if !self.suggestions.is_empty() {
            return match self.select(0) {
                Some(candidate) => SubmitAction::Select(candidate),
                None => SubmitAction::Ignore,
            };
        }

        let query = self.text.trim().to_string();
        if query.is_empty() {
            return SubmitAction::Ignore;
        }

        // A pending debounce must not pop suggestions up after the submit.
        self.supersede();
        self.phase = SearchPhase::Idle;
        SubmitAction::Lookup(query)
    }

    fn supersede(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
