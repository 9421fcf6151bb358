//! Autocomplete session bookkeeping.
//!
//! One session spans a single "type an address, pick a suggestion" flow.
//! The session token groups those keystrokes for the client, and the
//! session remembers the last query it sent so that repeated or
//! too-frequent keystrokes don't hit the upstream service.
//!
//! A session is plain data: the caller owns it and passes it into
//! [`crate::Geocoder::autocomplete`]. A stateless server resumes a session
//! from the client's token on every request, so only the length check
//! applies there; a long-lived client keeps the same value across
//! keystrokes and gets debouncing as well.

use std::time::{Duration, Instant};

use crate::address;
use crate::config::GeocoderConfig;

/// What to do with the text typed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryDecision {
    /// Send this normalized query upstream.
    Query(String),
    /// Fewer characters than the configured minimum.
    TooShort,
    /// Same text as the last query that was sent.
    Unchanged,
    /// Too soon after the previous request.
    Debounced {
        /// Time left until the debounce window closes.
        retry_after: Duration,
    },
}

/// Per-flow autocomplete state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteSession {
    token: String,
    last_query: Option<String>,
    last_sent_at: Option<Instant>,
}

impl Default for AutocompleteSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AutocompleteSession {
    /// Starts a session with a fresh random token.
    #[must_use]
    pub fn new() -> Self {
        Self::resume(&uuid::Uuid::new_v4().to_string())
    }

    /// Continues a session the client already holds a token for.
    #[must_use]
    pub fn resume(token: &str) -> Self {
        Self {
            token: token.to_string(),
            last_query: None,
            last_sent_at: None,
        }
    }

    /// Resumes `token` when present and non-blank, otherwise starts a new
    /// session.
    #[must_use]
    pub fn resume_or_new(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some(t) if !t.is_empty() => Self::resume(t),
            _ => Self::new(),
        }
    }

    /// The session token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Decides whether `input` should be sent upstream at `now`.
    #[must_use]
    pub fn decide(&self, input: &str, now: Instant, config: &GeocoderConfig) -> QueryDecision {
        let query = address::normalize_whitespace(input);

        if query.chars().count() < config.autocomplete_min_chars {
            return QueryDecision::TooShort;
        }

        if self.last_query.as_deref() == Some(query.as_str()) {
            return QueryDecision::Unchanged;
        }

        if let Some(last) = self.last_sent_at {
            let window = Duration::from_millis(config.autocomplete_debounce_ms);
            let elapsed = now.saturating_duration_since(last);
            if elapsed < window {
                return QueryDecision::Debounced {
                    retry_after: window - elapsed,
                };
            }
        }

        QueryDecision::Query(query)
    }

    /// Records that `query` was sent upstream at `now`.
    pub fn record(&mut self, query: &str, now: Instant) {
        self.last_query = Some(query.to_string());
        self.last_sent_at = Some(now);
    }
}
