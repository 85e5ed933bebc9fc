use serde::{Deserialize, Serialize};

/// Profiling counters collected by the (external) `FileFinder` as it
/// evaluates a term. The core only reads these; it never mutates them —
/// the walker owns the counting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TermCounters {
    pub match_time_seconds: f64,
    pub match_count: u64,
    pub miss_count: u64,
    pub collection_time_seconds: f64,
    pub bytes_read: u64,
}

/// A predicate handed to the FileFinder. Opaque to the core beyond its
/// identity (`name`) and the counters the walker fills in; `SampleSpec`s
/// resolve an incoming `Match` to their owning spec by matching on `name`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchTerm {
    pub name: String,
    pub required_criteria: String,
    pub counters: TermCounters,
}

impl SearchTerm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_criteria: String::new(),
            counters: TermCounters::default(),
        }
    }

    pub fn with_required_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.required_criteria = criteria.into();
        self
    }
}
