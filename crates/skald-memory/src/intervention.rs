//! Rolling memory of remediation actions taken against spirals.

use crate::pattern::{top3, MEMORY_CAP};
use serde::{Deserialize, Serialize};
use skald_core::SpiralPattern;
use std::collections::BTreeMap;

/// Well-known intervention types. The field is free-form; these are the
/// ones the tool records itself.
pub mod kind {
    /// Wrote a test to validate assumptions.
    pub const TRACER_TEST: &str = "tracer_test";
    pub const REVERT: &str = "revert";
    pub const RUBBER_DUCK: &str = "rubber_duck";
    pub const DOCS_CHECK: &str = "docs_check";
    pub const ENV_RESET: &str = "env_reset";
    pub const TAKE_BREAK: &str = "take_break";
}

/// One recorded remediation action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub pattern: SpiralPattern,
    pub component: String,
    /// Spiral duration at the time the action was taken, minutes.
    pub duration_minutes: i64,
    /// Whether the spiral ended after this action.
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
}

/// Aggregates derived from the record list; recomputed in full on every
/// mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionAggregates {
    #[serde(default)]
    pub count_by_type: BTreeMap<String, u64>,
    /// Intervention types that have been tried per pattern, deduplicated.
    #[serde(default)]
    pub types_by_pattern: BTreeMap<SpiralPattern, Vec<String>>,
    /// Top 3 types by frequency, descending.
    #[serde(default)]
    pub top_types: Vec<(String, u64)>,
    /// Mean spiral duration at time of intervention, minutes.
    #[serde(default)]
    pub avg_minutes_to_intervene: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterventionMemory {
    #[serde(default)]
    pub records: Vec<InterventionRecord>,
    #[serde(default)]
    pub aggregates: InterventionAggregates,
}

impl InterventionMemory {
    /// Append one intervention, truncate to the most recent
    /// [`MEMORY_CAP`], recompute all aggregates.
    pub fn record(&mut self, record: InterventionRecord) {
        self.records.push(record);
        if self.records.len() > MEMORY_CAP {
            let excess = self.records.len() - MEMORY_CAP;
            self.records.drain(..excess);
        }
        self.aggregates = recompute_intervention_aggregates(&self.records);
    }

    /// Recommend an intervention for a pattern: the most-used type for
    /// that specific pattern, else the overall most-used type, else None.
    pub fn recommend(&self, pattern: SpiralPattern) -> Option<String> {
        let mut for_pattern: BTreeMap<&str, u64> = BTreeMap::new();
        for record in self.records.iter().filter(|r| r.pattern == pattern) {
            *for_pattern.entry(record.kind.as_str()).or_insert(0) += 1;
        }
        if let Some((kind, _)) = for_pattern
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        {
            return Some(kind.to_string());
        }
        self.aggregates
            .top_types
            .first()
            .map(|(kind, _)| kind.clone())
    }

    /// Records matching a pattern, for lesson synthesis.
    pub fn records_for(&self, pattern: SpiralPattern) -> Vec<&InterventionRecord> {
        self.records.iter().filter(|r| r.pattern == pattern).collect()
    }
}

/// Pure reducer over the full record set.
pub fn recompute_intervention_aggregates(
    records: &[InterventionRecord],
) -> InterventionAggregates {
    let mut count_by_type: BTreeMap<String, u64> = BTreeMap::new();
    let mut types_by_pattern: BTreeMap<SpiralPattern, Vec<String>> = BTreeMap::new();
    let mut total_minutes: i64 = 0;

    for record in records {
        *count_by_type.entry(record.kind.clone()).or_insert(0) += 1;
        let types = types_by_pattern.entry(record.pattern).or_default();
        if !types.contains(&record.kind) {
            types.push(record.kind.clone());
        }
        total_minutes += record.duration_minutes;
    }

    let top_types = top3(&count_by_type);
    let avg_minutes_to_intervene = if records.is_empty() {
        0.0
    } else {
        total_minutes as f64 / records.len() as f64
    };

    InterventionAggregates {
        count_by_type,
        types_by_pattern,
        top_types,
        avg_minutes_to_intervene,
    }
}
