//! Observation state - last commit sha seen per repository
//!
//! Memory-resident only: the map lives as long as the monitor and starts
//! empty on every process start, so the first round always reports every
//! repository as new.

use std::collections::HashMap;

/// Result of comparing a fetched sha against the recorded one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// First observation, or the sha differs from the recorded one
    New { previous: Option<String> },
    Unchanged,
}

impl Change {
    pub fn is_new(&self) -> bool {
        matches!(self, Change::New { .. })
    }
}

/// Last-seen commit sha per repository name
#[derive(Debug, Clone, Default)]
pub struct ObservationState {
    last_seen: HashMap<String, String>,
}

impl ObservationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed state, e.g. to resume from known shas
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            last_seen: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn last_seen(&self, name: &str) -> Option<&str> {
        self.last_seen.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    /// Compare without recording
    pub fn detect(&self, name: &str, sha: &str) -> Change {
        match self.last_seen(name) {
            Some(previous) if previous == sha => Change::Unchanged,
            previous => Change::New {
                previous: previous.map(str::to_string),
            },
        }
    }

    /// Record `sha` as the latest seen for `name`. Entries are only ever
    /// replaced, never removed.
    pub fn record(&mut self, name: &str, sha: &str) {
        match self.last_seen.get_mut(name) {
            Some(existing) if existing == sha => {}
            Some(existing) => *existing = sha.to_string(),
            None => {
                self.last_seen.insert(name.to_string(), sha.to_string());
            }
        }
    }

    /// Detect and, when new, record in one step
    pub fn observe(&mut self, name: &str, sha: &str) -> Change {
        let change = self.detect(name, sha);
        if change.is_new() {
            self.record(name, sha);
        }
        change
    }
}
