//! Regression detection and improvement streaks over weekly buckets.

use crate::bucket::TrendBucket;
use serde::{Deserialize, Serialize};

/// Weekly buckets needed before regression detection runs.
const MIN_WEEKS: usize = 3;
/// Spiral-rate increase (fraction of the middle rate) that fires an alert.
const SPIRAL_INCREASE_TRIGGER: f64 = 0.5;
/// Increase beyond which the alert is critical instead of warning.
const SPIRAL_INCREASE_CRITICAL: f64 = 1.0;
/// Newest spiral rate must exceed this floor for an alert to fire at all.
const SPIRAL_RATE_FLOOR: f64 = 0.1;
/// Flow regression needs the middle week at or above this flow rate.
const FLOW_RATE_BASE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionKind {
    SpiralRate,
    FlowState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionSeverity {
    Warning,
    Critical,
}

/// An alert over the three most recent weekly buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionAlert {
    pub kind: RegressionKind,
    pub severity: RegressionSeverity,
    pub week: String,
    pub message: String,
}

/// Detect regressions over the three most recent weekly buckets
/// (oldest first). Requires at least [`MIN_WEEKS`] buckets.
pub fn detect_regressions(weekly: &[TrendBucket]) -> Vec<RegressionAlert> {
    if weekly.len() < MIN_WEEKS {
        return Vec::new();
    }
    let oldest = &weekly[weekly.len() - 3];
    let middle = &weekly[weekly.len() - 2];
    let newest = &weekly[weekly.len() - 1];

    let mut alerts = Vec::new();

    // Spiral-rate regression: the rate had been improving into the middle
    // week, then bounced back by half or more, above the noise floor.
    let was_improving = middle.spiral_rate() < oldest.spiral_rate();
    if was_improving && newest.spiral_rate() > SPIRAL_RATE_FLOOR {
        // A clean middle week bouncing back is an unbounded increase
        let increase = if middle.spiral_rate() > 0.0 {
            (newest.spiral_rate() - middle.spiral_rate()) / middle.spiral_rate()
        } else {
            f64::INFINITY
        };
        if increase >= SPIRAL_INCREASE_TRIGGER {
            let severity = if increase > SPIRAL_INCREASE_CRITICAL {
                RegressionSeverity::Critical
            } else {
                RegressionSeverity::Warning
            };
            alerts.push(RegressionAlert {
                kind: RegressionKind::SpiralRate,
                severity,
                week: newest.key.clone(),
                message: format!(
                    "spiral rate rose to {:.2} per session (from {:.2}) after improving",
                    newest.spiral_rate(),
                    middle.spiral_rate()
                ),
            });
        }
    }

    // Flow-state regression: a solid flow week followed by a collapse to
    // less than half of it.
    if middle.flow_rate() >= FLOW_RATE_BASE && newest.flow_rate() < middle.flow_rate() / 2.0 {
        alerts.push(RegressionAlert {
            kind: RegressionKind::FlowState,
            severity: RegressionSeverity::Warning,
            week: newest.key.clone(),
            message: format!(
                "flow-state rate fell from {:.0}% to {:.0}% of sessions",
                middle.flow_rate() * 100.0,
                newest.flow_rate() * 100.0
            ),
        });
    }

    alerts
}

/// Count consecutive non-regressing weeks, walking backward from the
/// second-most-recent bucket: a week extends the streak when its spiral
/// rate did not increase over the next-older week's.
pub fn improvement_streak(weekly: &[TrendBucket]) -> usize {
    if weekly.len() < 2 {
        return 0;
    }
    let mut streak = 0;
    for i in (1..weekly.len() - 1).rev() {
        if weekly[i].spiral_rate() <= weekly[i - 1].spiral_rate() {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}
