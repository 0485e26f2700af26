//! Pattern Score: workflow-risk early warning over a commit window.
//!
//! Independent of the five session metrics. Four heuristics, each
//! normalized to a 0..1 risk, combined as a weighted sum scaled to 0..100.
//! Higher means riskier.

use serde::{Deserialize, Serialize};
use skald_core::Commit;
use std::collections::BTreeMap;
use time::Duration;

pub const FILE_CHURN_WEIGHT: f64 = 0.30;
pub const TIME_SPIRAL_WEIGHT: f64 = 0.25;
pub const VELOCITY_ANOMALY_WEIGHT: f64 = 0.20;
pub const CODE_STABILITY_WEIGHT: f64 = 0.25;

/// A file touched this many times within one hour counts as churning.
const CHURN_TOUCHES: usize = 3;
/// Consecutive commits closer than this are a time spiral signal.
const TIME_SPIRAL_GAP_MINUTES: i64 = 5;

/// Personal commits-per-hour baseline used for anomaly detection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VelocityBaseline {
    pub mean: f64,
    pub stdev: f64,
}

impl VelocityBaseline {
    /// Fit a baseline from per-session velocities.
    pub fn fit(velocities: &[f64]) -> Self {
        if velocities.is_empty() {
            return Self::default();
        }
        let n = velocities.len() as f64;
        let mean = velocities.iter().sum::<f64>() / n;
        let variance = velocities.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            stdev: variance.sqrt(),
        }
    }
}

/// Weighted risk score with its per-heuristic breakdown (each 0..1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PatternScore {
    pub total: f64,
    pub file_churn: f64,
    pub time_spiral: f64,
    pub velocity_anomaly: f64,
    pub code_stability: f64,
}

/// Score a commit window against a personal velocity baseline.
/// Commits are evaluated in time order; unsorted input is sorted first.
pub fn pattern_score(commits: &[Commit], baseline: &VelocityBaseline) -> PatternScore {
    let mut ordered: Vec<&Commit> = commits.iter().collect();
    ordered.sort_by_key(|c| c.ts);

    let file_churn = file_churn_risk(&ordered);
    let time_spiral = time_spiral_risk(&ordered);
    let velocity_anomaly = velocity_anomaly_risk(&ordered, baseline);
    let code_stability = code_stability_risk(&ordered);

    let total = (file_churn * FILE_CHURN_WEIGHT
        + time_spiral * TIME_SPIRAL_WEIGHT
        + velocity_anomaly * VELOCITY_ANOMALY_WEIGHT
        + code_stability * CODE_STABILITY_WEIGHT)
        * 100.0;

    PatternScore {
        total,
        file_churn,
        time_spiral,
        velocity_anomaly,
        code_stability,
    }
}

/// Share of touched files that were touched >= 3 times within one hour.
fn file_churn_risk(ordered: &[&Commit]) -> f64 {
    let mut touches: BTreeMap<&str, Vec<time::OffsetDateTime>> = BTreeMap::new();
    for commit in ordered {
        for file in &commit.files {
            touches.entry(file.as_str()).or_default().push(commit.ts);
        }
    }
    if touches.is_empty() {
        return 0.0;
    }
    let hour = Duration::hours(1);
    let churning = touches
        .values()
        .filter(|ts| {
            ts.windows(CHURN_TOUCHES)
                .any(|w| w[CHURN_TOUCHES - 1] - w[0] <= hour)
        })
        .count();
    churning as f64 / touches.len() as f64
}

/// Fraction of consecutive commit gaps under five minutes.
fn time_spiral_risk(ordered: &[&Commit]) -> f64 {
    if ordered.len() < 2 {
        return 0.0;
    }
    let gap = Duration::minutes(TIME_SPIRAL_GAP_MINUTES);
    let rapid = ordered
        .windows(2)
        .filter(|w| w[1].ts - w[0].ts < gap)
        .count();
    rapid as f64 / (ordered.len() - 1) as f64
}

/// Z-score of the window's velocity against the personal baseline,
/// mapped to bands: <1 sigma -> 0, <1.5 -> 1/3, <2 -> 2/3, else 1.
fn velocity_anomaly_risk(ordered: &[&Commit], baseline: &VelocityBaseline) -> f64 {
    if ordered.len() < 2 || baseline.stdev <= 0.0 {
        return 0.0;
    }
    let span = ordered[ordered.len() - 1].ts - ordered[0].ts;
    let hours = (span.whole_minutes() as f64 / 60.0).max(1.0 / 60.0);
    let velocity = ordered.len() as f64 / hours;
    let z = (velocity - baseline.mean).abs() / baseline.stdev;
    if z < 1.0 {
        0.0
    } else if z < 1.5 {
        1.0 / 3.0
    } else if z < 2.0 {
        2.0 / 3.0
    } else {
        1.0
    }
}

/// Instability = deletions / (additions * 0.5), clamped to [0,1].
/// Heavy deletion relative to addition reads as thrash.
fn code_stability_risk(ordered: &[&Commit]) -> f64 {
    let added: u64 = ordered.iter().map(|c| c.added).sum();
    let deleted: u64 = ordered.iter().map(|c| c.deleted).sum();
    if added == 0 {
        return if deleted > 0 { 1.0 } else { 0.0 };
    }
    (deleted as f64 / (added as f64 * 0.5)).clamp(0.0, 1.0)
}
