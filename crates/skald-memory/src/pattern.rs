//! Rolling memory of observed debug spirals.
//!
//! Mutations append to a capped record list and recompute every aggregate
//! from the full (truncated) record set. Aggregates are never patched
//! incrementally, so they cannot drift from the records they summarize.

use serde::{Deserialize, Serialize};
use skald_core::SpiralPattern;
use skald_segment::FixChain;
use std::collections::BTreeMap;

/// Maximum records retained in a rolling memory.
pub const MEMORY_CAP: usize = 100;

/// One observed spiral, as remembered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiralRecord {
    pub pattern: SpiralPattern,
    pub component: String,
    pub duration_minutes: i64,
    pub commit_count: usize,
    /// `YYYY-MM-DD`
    pub date: String,
}

impl SpiralRecord {
    pub fn from_chain(chain: &FixChain) -> Self {
        Self {
            pattern: chain.pattern,
            component: chain.component.clone(),
            duration_minutes: chain.duration_minutes,
            commit_count: chain.commit_count,
            date: crate::date_string(chain.last_ts),
        }
    }
}

/// Aggregates derived from the record list. Always produced by
/// [`recompute_pattern_aggregates`], never hand-edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternAggregates {
    #[serde(default)]
    pub count_by_pattern: BTreeMap<SpiralPattern, u64>,
    #[serde(default)]
    pub count_by_component: BTreeMap<String, u64>,
    #[serde(default)]
    pub duration_by_pattern: BTreeMap<SpiralPattern, i64>,
    /// Top 3 patterns by occurrence count, descending.
    #[serde(default)]
    pub top_patterns: Vec<(SpiralPattern, u64)>,
    /// Top 3 components by occurrence count, descending.
    #[serde(default)]
    pub top_components: Vec<(String, u64)>,
    /// Mean spiral duration across all records, minutes.
    #[serde(default)]
    pub avg_duration_minutes: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternMemory {
    #[serde(default)]
    pub records: Vec<SpiralRecord>,
    #[serde(default)]
    pub aggregates: PatternAggregates,
}

impl PatternMemory {
    /// Record the spirals among the given chains. Appends, truncates to
    /// the most recent [`MEMORY_CAP`], then recomputes all aggregates.
    pub fn record(&mut self, chains: &[FixChain]) {
        for chain in chains.iter().filter(|c| c.is_spiral) {
            self.records.push(SpiralRecord::from_chain(chain));
        }
        if self.records.len() > MEMORY_CAP {
            let excess = self.records.len() - MEMORY_CAP;
            self.records.drain(..excess);
        }
        self.aggregates = recompute_pattern_aggregates(&self.records);
        tracing::debug!(
            records = self.records.len(),
            "pattern memory recorded spirals"
        );
    }

    /// Occurrences of a pattern across the retained records.
    pub fn occurrences(&self, pattern: SpiralPattern) -> u64 {
        self.aggregates
            .count_by_pattern
            .get(&pattern)
            .copied()
            .unwrap_or(0)
    }

    /// Total minutes attributed to a pattern across the retained records.
    pub fn minutes_wasted(&self, pattern: SpiralPattern) -> i64 {
        self.aggregates
            .duration_by_pattern
            .get(&pattern)
            .copied()
            .unwrap_or(0)
    }

    /// Distinct components seen for a pattern, sorted.
    pub fn components_for(&self, pattern: SpiralPattern) -> Vec<String> {
        let mut components: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.pattern == pattern)
            .map(|r| r.component.clone())
            .collect();
        components.sort();
        components.dedup();
        components
    }
}

/// Pure reducer: full record set in, fresh aggregate struct out. Total
/// over any record count from zero to the cap.
pub fn recompute_pattern_aggregates(records: &[SpiralRecord]) -> PatternAggregates {
    let mut count_by_pattern: BTreeMap<SpiralPattern, u64> = BTreeMap::new();
    let mut count_by_component: BTreeMap<String, u64> = BTreeMap::new();
    let mut duration_by_pattern: BTreeMap<SpiralPattern, i64> = BTreeMap::new();
    let mut total_minutes: i64 = 0;

    for record in records {
        *count_by_pattern.entry(record.pattern).or_insert(0) += 1;
        *count_by_component
            .entry(record.component.clone())
            .or_insert(0) += 1;
        *duration_by_pattern.entry(record.pattern).or_insert(0) += record.duration_minutes;
        total_minutes += record.duration_minutes;
    }

    let top_patterns = top3(&count_by_pattern);
    let top_components = top3(&count_by_component);
    let avg_duration_minutes = if records.is_empty() {
        0.0
    } else {
        total_minutes as f64 / records.len() as f64
    };

    PatternAggregates {
        count_by_pattern,
        count_by_component,
        duration_by_pattern,
        top_patterns,
        top_components,
        avg_duration_minutes,
    }
}

/// Top 3 entries by count descending; ties break on key order for
/// deterministic output.
pub(crate) fn top3<K: Clone + Ord>(counts: &BTreeMap<K, u64>) -> Vec<(K, u64)> {
    let mut entries: Vec<(K, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(3);
    entries
}
