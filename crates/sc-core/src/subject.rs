//! In-memory representation of one sampled population.
//!
//! External loaders fill a `Subject` with named category counts; the engine
//! only consumes the count vector, sorted by decreasing frequency — the
//! discovery-order convention the unseen-species correction assumes.

use serde::{Deserialize, Serialize};

/// A labeled collection of observed (category, count) pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    code: String,
    species: Vec<(String, u32)>,
}

impl Subject {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            species: Vec::new(),
        }
    }

    /// Subject identifier from the source dataset.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Record one observed category and how many individuals it covered.
    pub fn add(&mut self, name: impl Into<String>, count: u32) {
        self.species.push((name.into(), count));
    }

    /// Sort into discovery order: decreasing count, names breaking ties.
    pub fn sort(&mut self) {
        self.species
            .sort_by(|(a_name, a_count), (b_name, b_count)| {
                b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
            });
    }

    /// Observed counts in current order.
    pub fn counts(&self) -> Vec<u32> {
        self.species.iter().map(|(_, count)| *count).collect()
    }

    /// Number of distinct observed categories.
    pub fn observed(&self) -> usize {
        self.species.len()
    }

    /// (name, count) pairs in current order.
    pub fn species(&self) -> &[(String, u32)] {
        &self.species
    }
}
