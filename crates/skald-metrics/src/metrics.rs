//! The five workflow-health metrics.
//!
//! | Metric | Formula | ELITE | HIGH | MEDIUM | LOW |
//! |---|---|---|---|---|---|
//! | iteration velocity (commits/hr) | commits / activeHours | >=5 | >=3 | >=1 | <1 |
//! | rework ratio (%) | fix / total * 100 | <30 | <50 | <70 | >=70 |
//! | trust pass rate (%) | no fix to same file within 30 min | >95 | >=80 | >=60 | <60 |
//! | spiral duration (min) | mean spiral duration | <15 | <30 | <60 | >=60 |
//! | flow efficiency (%) | (active - spiral) / active * 100 | >90 | >=75 | >=50 | <50 |

use crate::rating::{MetricValue, Rating};
use serde::{Deserialize, Serialize};
use skald_core::Commit;
use skald_segment::Session;
use time::Duration;

/// A later fix to the same file within this window voids a commit's
/// trust pass.
const TRUST_WINDOW_MINUTES: i64 = 30;

/// Commits per active hour. Active hours are floored at one minute so a
/// zero-span burst rates by its commit count, not a division blow-up.
pub fn iteration_velocity(commit_count: usize, active_hours: f64) -> MetricValue {
    let hours = active_hours.max(1.0 / 60.0);
    let value = commit_count as f64 / hours;
    let rating = if value >= 5.0 {
        Rating::Elite
    } else if value >= 3.0 {
        Rating::High
    } else if value >= 1.0 {
        Rating::Medium
    } else {
        Rating::Low
    };
    MetricValue { value, rating }
}

/// Percentage of commits that are fixes. Zero commits is zero rework.
pub fn rework_ratio(fix_count: usize, total: usize) -> MetricValue {
    let value = if total == 0 {
        0.0
    } else {
        fix_count as f64 / total as f64 * 100.0
    };
    let rating = if value < 30.0 {
        Rating::Elite
    } else if value < 50.0 {
        Rating::High
    } else if value < 70.0 {
        Rating::Medium
    } else {
        Rating::Low
    };
    MetricValue { value, rating }
}

/// Percentage of commits not followed by a fix to one of their files
/// within 30 minutes. Empty input trusts trivially at 100%.
pub fn trust_pass_rate(commits: &[Commit]) -> MetricValue {
    let total = commits.len();
    let value = if total == 0 {
        100.0
    } else {
        let window = Duration::minutes(TRUST_WINDOW_MINUTES);
        let passed = commits
            .iter()
            .enumerate()
            .filter(|(i, c)| {
                !commits[i + 1..]
                    .iter()
                    .take_while(|later| later.ts - c.ts <= window)
                    .any(|later| {
                        later.is_fix() && later.files.iter().any(|f| c.files.contains(f))
                    })
            })
            .count();
        passed as f64 / total as f64 * 100.0
    };
    let rating = if value > 95.0 {
        Rating::Elite
    } else if value >= 80.0 {
        Rating::High
    } else if value >= 60.0 {
        Rating::Medium
    } else {
        Rating::Low
    };
    MetricValue { value, rating }
}

/// Mean duration of debug spirals, in minutes. No spirals rates ELITE.
pub fn spiral_duration(spiral_minutes: &[i64]) -> MetricValue {
    let value = if spiral_minutes.is_empty() {
        0.0
    } else {
        spiral_minutes.iter().sum::<i64>() as f64 / spiral_minutes.len() as f64
    };
    let rating = if value < 15.0 {
        Rating::Elite
    } else if value < 30.0 {
        Rating::High
    } else if value < 60.0 {
        Rating::Medium
    } else {
        Rating::Low
    };
    MetricValue { value, rating }
}

/// Share of active time spent outside spirals, clamped to [0,100].
/// Zero active minutes is perfect flow by definition.
pub fn flow_efficiency(active_minutes: i64, spiral_minutes: i64) -> MetricValue {
    let value = if active_minutes <= 0 {
        100.0
    } else {
        let pct = (active_minutes - spiral_minutes) as f64 / active_minutes as f64 * 100.0;
        pct.clamp(0.0, 100.0)
    };
    let rating = if value > 90.0 {
        Rating::Elite
    } else if value >= 75.0 {
        Rating::High
    } else if value >= 50.0 {
        Rating::Medium
    } else {
        Rating::Low
    };
    MetricValue { value, rating }
}

/// Composite "Code Health" grade: average of the five metric ratings.
pub fn code_health(ratings: &[Rating]) -> Rating {
    if ratings.is_empty() {
        return Rating::Low;
    }
    let avg =
        ratings.iter().map(|r| r.points() as f64).sum::<f64>() / ratings.len() as f64;
    if avg >= 3.5 {
        Rating::Elite
    } else if avg >= 2.5 {
        Rating::High
    } else if avg >= 1.5 {
        Rating::Medium
    } else {
        Rating::Low
    }
}

/// The five metrics for one session, plus the composite grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub iteration_velocity: MetricValue,
    pub rework_ratio: MetricValue,
    pub trust_pass_rate: MetricValue,
    pub spiral_duration: MetricValue,
    pub flow_efficiency: MetricValue,
    pub code_health: Rating,
}

impl SessionMetrics {
    /// Numeric 0-100 score derived from the composite average, for the
    /// session record and reward layer.
    pub fn score(&self) -> f64 {
        let ratings = [
            self.iteration_velocity.rating,
            self.rework_ratio.rating,
            self.trust_pass_rate.rating,
            self.spiral_duration.rating,
            self.flow_efficiency.rating,
        ];
        let avg =
            ratings.iter().map(|r| r.points() as f64).sum::<f64>() / ratings.len() as f64;
        (avg - 1.0) / 3.0 * 100.0
    }
}

/// Compute all five metrics for a segmented session.
pub fn compute_session_metrics(session: &Session) -> SessionMetrics {
    let active_minutes = session.duration_minutes();
    let active_hours = active_minutes as f64 / 60.0;
    let spiral_durations: Vec<i64> = session.spirals().map(|s| s.duration_minutes).collect();

    let iteration_velocity = iteration_velocity(session.commits.len(), active_hours);
    let rework_ratio = rework_ratio(session.fix_count(), session.commits.len());
    let trust_pass_rate = trust_pass_rate(&session.commits);
    let spiral_duration = spiral_duration(&spiral_durations);
    let flow_efficiency = flow_efficiency(active_minutes, session.spiral_minutes());
    let code_health = code_health(&[
        iteration_velocity.rating,
        rework_ratio.rating,
        trust_pass_rate.rating,
        spiral_duration.rating,
        flow_efficiency.rating,
    ]);

    SessionMetrics {
        iteration_velocity,
        rework_ratio,
        trust_pass_rate,
        spiral_duration,
        flow_efficiency,
        code_health,
    }
}
