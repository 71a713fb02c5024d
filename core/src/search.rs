//! Debounced incremental search with sequence-gated commits.
//!
//! Each [`SearchDebouncer::input`] call bumps a generation counter and sleeps
//! for the quiet period. Only the call whose generation is still current when
//! it wakes issues a lookup. Issued lookups carry a sequence number, and a
//! response is committed only while its number is the latest issued.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::SearchSource;
use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub quiet_period: Duration,
    /// Minimum trimmed query length, in characters, before a lookup is issued.
    pub min_query_len: usize,
}

impl SearchConfig {
    /// The food picker on the logging page.
    #[must_use]
    pub fn foods() -> Self {
        Self {
            quiet_period: Duration::from_millis(300),
            min_query_len: 2,
        }
    }

    /// The food library page.
    #[must_use]
    pub fn food_library() -> Self {
        Self {
            quiet_period: Duration::from_millis(300),
            min_query_len: 1,
        }
    }

    #[must_use]
    pub fn exercises() -> Self {
        Self {
            quiet_period: Duration::from_millis(250),
            min_query_len: 1,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::foods()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// This input's lookup was the latest issued and its results are now visible.
    Committed { seq: u64, count: usize },
    /// A newer input arrived during the quiet period.
    Debounced,
    /// The query was too short; visible results were cleared.
    BelowMinimum,
    /// The lookup resolved after a newer one was issued and was discarded.
    Stale { seq: u64 },
}

#[derive(Debug)]
struct SearchState<T> {
    generation: u64,
    latest_seq: u64,
    committed_seq: u64,
    lookups_issued: u64,
    query: String,
    results: Vec<T>,
}

pub struct SearchDebouncer<S: SearchSource> {
    source: S,
    config: SearchConfig,
    state: Mutex<SearchState<S::Item>>,
}

impl<S: SearchSource> SearchDebouncer<S> {
    pub fn new(source: S, config: SearchConfig) -> Self {
        Self {
            source,
            config,
            state: Mutex::new(SearchState {
                generation: 0,
                latest_seq: 0,
                committed_seq: 0,
                lookups_issued: 0,
                query: String::new(),
                results: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    /// Feed one query change. Resolves once this input has been debounced away
    /// or its lookup has settled.
    pub async fn input(&self, query: &str) -> SearchOutcome {
        let query = query.trim().to_string();

        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.query.clone_from(&query);
            if query.chars().count() < self.config.min_query_len {
                // Supersede anything in flight so it cannot repopulate the list
                state.latest_seq += 1;
                state.results.clear();
                debug!(query = %query, "query below minimum length, results cleared");
                return SearchOutcome::BelowMinimum;
            }
            state.generation
        };

        tokio::time::sleep(self.config.quiet_period).await;

        let seq = {
            let mut state = lock(&self.state);
            if state.generation != generation {
                return SearchOutcome::Debounced;
            }
            state.latest_seq += 1;
            state.lookups_issued += 1;
            state.latest_seq
        };
        debug!(seq, query = %query, "search lookup issued");

        let result = self.source.search(&query).await;

        let mut state = lock(&self.state);
        if seq != state.latest_seq {
            debug!(seq, latest = state.latest_seq, "discarding stale search response");
            return SearchOutcome::Stale { seq };
        }
        let results = result.unwrap_or_else(|err| {
            warn!(seq, query = %query, error = %err, "search lookup failed");
            Vec::new()
        });
        let count = results.len();
        state.results = results;
        state.committed_seq = seq;
        debug!(seq, count, "search results committed");
        SearchOutcome::Committed { seq, count }
    }

    /// The currently visible result set.
    pub fn results(&self) -> Vec<S::Item> {
        lock(&self.state).results.clone()
    }

    /// The most recent trimmed query, whether or not it was looked up.
    pub fn query(&self) -> String {
        lock(&self.state).query.clone()
    }

    pub fn lookups_issued(&self) -> u64 {
        lock(&self.state).lookups_issued
    }

    /// Sequence number of the lookup whose results are visible (0 if none).
    pub fn committed_seq(&self) -> u64 {
        lock(&self.state).committed_seq
    }
}
