use serde::{Deserialize, Serialize};
use skald_metrics::{Rating, SessionMetrics};
use time::OffsetDateTime;

/// Half-open time window `[from, to)` an analysis run covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedPeriod {
    #[serde(with = "time::serde::rfc3339")]
    pub from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to: OffsetDateTime,
}

impl AnalyzedPeriod {
    pub fn duration_seconds(&self) -> i64 {
        (self.to - self.from).whole_seconds().max(0)
    }

    /// Seconds shared between two half-open periods.
    pub fn overlap_seconds(&self, other: &AnalyzedPeriod) -> i64 {
        let start = self.from.max(other.from);
        let end = self.to.min(other.to);
        (end - start).whole_seconds().max(0)
    }
}

/// Compressed, persisted form of an analyzed session. Immutable once
/// written except for reward backfill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// `YYYY-MM-DD`
    pub date: String,
    /// RFC 3339 instant the record was written.
    pub ts: String,
    /// 0..=100 composite score.
    pub score: f64,
    pub rating: Rating,
    pub commit_count: usize,
    pub spiral_count: usize,
    pub active_minutes: i64,
    #[serde(default)]
    pub flow_state: bool,
    /// Units granted to the external reward layer. Zero for duplicates.
    #[serde(default)]
    pub reward_units: u64,
    /// Present when the caller analyzed an explicit historical window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<AnalyzedPeriod>,
    /// Detailed metrics snapshot, when the caller asked to keep one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SessionMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::format_description::well_known::Rfc3339;

    fn at(s: &str) -> OffsetDateTime {
        OffsetDateTime::parse(s, &Rfc3339).unwrap()
    }

    #[test]
    fn duration_and_overlap() {
        let a = AnalyzedPeriod {
            from: at("2026-03-02T09:00:00Z"),
            to: at("2026-03-02T11:00:00Z"),
        };
        let b = AnalyzedPeriod {
            from: at("2026-03-02T10:00:00Z"),
            to: at("2026-03-02T12:00:00Z"),
        };
        assert_eq!(a.duration_seconds(), 7200);
        assert_eq!(a.overlap_seconds(&b), 3600);
        assert_eq!(b.overlap_seconds(&a), 3600);
    }

    #[test]
    fn disjoint_periods_do_not_overlap() {
        let a = AnalyzedPeriod {
            from: at("2026-03-02T09:00:00Z"),
            to: at("2026-03-02T10:00:00Z"),
        };
        let b = AnalyzedPeriod {
            from: at("2026-03-02T10:00:00Z"),
            to: at("2026-03-02T11:00:00Z"),
        };
        assert_eq!(a.overlap_seconds(&b), 0);
    }

    #[test]
    fn inverted_period_has_zero_duration() {
        let a = AnalyzedPeriod {
            from: at("2026-03-02T11:00:00Z"),
            to: at("2026-03-02T09:00:00Z"),
        };
        assert_eq!(a.duration_seconds(), 0);
    }

    #[test]
    fn record_round_trip_without_optionals() {
        let record = SessionRecord {
            date: "2026-03-02".to_string(),
            ts: "2026-03-02T11:00:00Z".to_string(),
            score: 83.3,
            rating: Rating::High,
            commit_count: 12,
            spiral_count: 1,
            active_minutes: 95,
            flow_state: false,
            reward_units: 120,
            period: None,
            metrics: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("period"));
        assert!(!json.contains("metrics"));
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.commit_count, 12);
        assert_eq!(back.rating, Rating::High);
    }
}
