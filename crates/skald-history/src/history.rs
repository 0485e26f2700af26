//! Per-repository session record history with anti-gaming checks.
//!
//! Before a record with an explicit analyzed period is persisted, the last
//! 50 stored periods are scanned. An exact period match, or an overlap
//! above 80% of the candidate's own duration, marks the submission as a
//! duplicate: it is not persisted and earns zero reward. Duplicates are a
//! result, not an error; the caller decides how to surface them.

use crate::record::{AnalyzedPeriod, SessionRecord};
use serde::{Deserialize, Serialize};
use skald_store::StorePaths;
use std::path::PathBuf;

pub const HISTORY_VERSION: u32 = 1;
/// Records retained per repository.
pub const HISTORY_CAP: usize = 100;
/// Prior records scanned for duplicate periods.
pub const DUPLICATE_SCAN: usize = 50;
/// Overlap share of the candidate's duration that marks a duplicate.
/// Strictly greater-than: exactly 80% is not a duplicate.
pub const OVERLAP_LIMIT: f64 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    pub version: u32,
    #[serde(default)]
    pub records: Vec<SessionRecord>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            version: HISTORY_VERSION,
            records: Vec::new(),
        }
    }
}

/// Outcome of a record submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub is_duplicate: bool,
    pub reward_units: u64,
}

/// Handle on one repository's `history.json`. Stateless between calls;
/// every mutation is load, compute, save.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn open(paths: &StorePaths, project_id: &str) -> Self {
        Self {
            path: paths.project_history(project_id),
        }
    }

    pub fn load(&self) -> anyhow::Result<History> {
        skald_store::load_versioned(&self.path, HISTORY_VERSION, |_found, _value| {
            // v1 is the first envelope; nothing to rewrite yet
        })
    }

    /// Persist a session record unless its analyzed period duplicates a
    /// prior one. The history is capped to the most recent
    /// [`HISTORY_CAP`] records.
    pub fn record(&self, record: SessionRecord) -> anyhow::Result<RecordOutcome> {
        let mut history = self.load()?;
        if is_duplicate_period(&history.records, record.period.as_ref()) {
            tracing::info!(date = %record.date, "rejected duplicate analyzed period");
            return Ok(RecordOutcome {
                is_duplicate: true,
                reward_units: 0,
            });
        }
        let reward_units = record.reward_units;
        history.records.push(record);
        if history.records.len() > HISTORY_CAP {
            let excess = history.records.len() - HISTORY_CAP;
            history.records.drain(..excess);
        }
        skald_store::save_state(&self.path, &history)?;
        Ok(RecordOutcome {
            is_duplicate: false,
            reward_units,
        })
    }

    /// Backfill the reward units of the record written at `ts`. The one
    /// permitted mutation of an existing record. Returns false when no
    /// record matches.
    pub fn backfill_reward(&self, ts: &str, reward_units: u64) -> anyhow::Result<bool> {
        let mut history = self.load()?;
        let Some(record) = history.records.iter_mut().find(|r| r.ts == ts) else {
            return Ok(false);
        };
        record.reward_units = reward_units;
        skald_store::save_state(&self.path, &history)?;
        Ok(true)
    }
}

/// True when the candidate period exactly matches, or overlaps more than
/// [`OVERLAP_LIMIT`] of its own duration with, any of the last
/// [`DUPLICATE_SCAN`] stored periods. Records without periods never
/// conflict.
pub fn is_duplicate_period(
    records: &[SessionRecord],
    candidate: Option<&AnalyzedPeriod>,
) -> bool {
    let Some(candidate) = candidate else {
        return false;
    };
    let duration = candidate.duration_seconds();
    records
        .iter()
        .rev()
        .take(DUPLICATE_SCAN)
        .filter_map(|r| r.period.as_ref())
        .any(|prior| {
            if prior == candidate {
                return true;
            }
            if duration == 0 {
                return false;
            }
            candidate.overlap_seconds(prior) as f64 > OVERLAP_LIMIT * duration as f64
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_metrics::Rating;
    use time::format_description::well_known::Rfc3339;
    use time::{Duration, OffsetDateTime};

    fn at(s: &str) -> OffsetDateTime {
        OffsetDateTime::parse(s, &Rfc3339).unwrap()
    }

    fn record(ts: &str, period: Option<AnalyzedPeriod>) -> SessionRecord {
        SessionRecord {
            date: "2026-03-02".to_string(),
            ts: ts.to_string(),
            score: 70.0,
            rating: Rating::High,
            commit_count: 8,
            spiral_count: 0,
            active_minutes: 60,
            flow_state: false,
            reward_units: 100,
            period,
            metrics: None,
        }
    }

    fn store() -> (tempfile::TempDir, HistoryStore) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::discover(tmp.path().join("store"));
        let store = HistoryStore::open(&paths, "proj1");
        (tmp, store)
    }

    #[test]
    fn record_and_load_round_trip() {
        let (_tmp, store) = store();
        let outcome = store.record(record("2026-03-02T10:00:00Z", None)).unwrap();
        assert!(!outcome.is_duplicate);
        assert_eq!(outcome.reward_units, 100);
        assert_eq!(store.load().unwrap().records.len(), 1);
    }

    #[test]
    fn exact_period_match_is_duplicate() {
        let (_tmp, store) = store();
        let period = AnalyzedPeriod {
            from: at("2026-03-01T00:00:00Z"),
            to: at("2026-03-02T00:00:00Z"),
        };
        store
            .record(record("2026-03-02T10:00:00Z", Some(period)))
            .unwrap();

        let outcome = store
            .record(record("2026-03-02T11:00:00Z", Some(period)))
            .unwrap();
        assert!(outcome.is_duplicate);
        assert_eq!(outcome.reward_units, 0);
        // Rejected submissions are not persisted
        assert_eq!(store.load().unwrap().records.len(), 1);
    }

    #[test]
    fn overlap_at_exactly_80_percent_is_not_duplicate() {
        let base_from = at("2026-03-01T00:00:00Z");
        let prior = AnalyzedPeriod {
            from: base_from,
            to: base_from + Duration::seconds(10_000),
        };
        let stored = vec![record("t1", Some(prior))];

        // Candidate: 10,000s long, shifted so exactly 8,000s overlap
        let candidate = AnalyzedPeriod {
            from: base_from + Duration::seconds(2_000),
            to: base_from + Duration::seconds(12_000),
        };
        assert_eq!(candidate.overlap_seconds(&prior), 8_000);
        assert!(!is_duplicate_period(&stored, Some(&candidate)));
    }

    #[test]
    fn overlap_just_above_80_percent_is_duplicate() {
        let base_from = at("2026-03-01T00:00:00Z");
        let prior = AnalyzedPeriod {
            from: base_from,
            to: base_from + Duration::seconds(10_000),
        };
        let stored = vec![record("t1", Some(prior))];

        let candidate = AnalyzedPeriod {
            from: base_from + Duration::seconds(1_999),
            to: base_from + Duration::seconds(11_999),
        };
        assert_eq!(candidate.overlap_seconds(&prior), 8_001);
        assert!(is_duplicate_period(&stored, Some(&candidate)));
    }

    #[test]
    fn periodless_records_never_conflict() {
        let stored = vec![record("t1", None)];
        let candidate = AnalyzedPeriod {
            from: at("2026-03-01T00:00:00Z"),
            to: at("2026-03-02T00:00:00Z"),
        };
        assert!(!is_duplicate_period(&stored, Some(&candidate)));
        assert!(!is_duplicate_period(&stored, None));
    }

    #[test]
    fn scan_only_considers_last_50_periods() {
        let base_from = at("2026-01-01T00:00:00Z");
        let old_period = AnalyzedPeriod {
            from: base_from,
            to: base_from + Duration::hours(1),
        };
        let mut stored = vec![record("old", Some(old_period))];
        for i in 0..50 {
            let from = base_from + Duration::days(i + 1);
            stored.push(record(
                &format!("t{i}"),
                Some(AnalyzedPeriod {
                    from,
                    to: from + Duration::hours(1),
                }),
            ));
        }
        // The old period has been pushed out of the scan window
        assert!(!is_duplicate_period(&stored, Some(&old_period)));
    }

    #[test]
    fn history_capped_at_100() {
        let (_tmp, store) = store();
        for i in 0..110 {
            store
                .record(record(&format!("2026-03-02T10:{:02}:00Z", i % 60), None))
                .map(|_| ())
                .unwrap();
        }
        let history = store.load().unwrap();
        assert_eq!(history.records.len(), HISTORY_CAP);
    }

    #[test]
    fn backfill_reward_updates_matching_record() {
        let (_tmp, store) = store();
        store.record(record("2026-03-02T10:00:00Z", None)).unwrap();
        assert!(store.backfill_reward("2026-03-02T10:00:00Z", 999).unwrap());
        assert_eq!(store.load().unwrap().records[0].reward_units, 999);
        assert!(!store.backfill_reward("2099-01-01T00:00:00Z", 1).unwrap());
    }

    #[test]
    fn corrupted_history_recovers_to_default() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::discover(tmp.path().join("store"));
        let store = HistoryStore::open(&paths, "proj1");
        let path = paths.project_history("proj1");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "][").unwrap();

        let history = store.load().unwrap();
        assert!(history.records.is_empty());
        assert_eq!(history.version, HISTORY_VERSION);
    }
}
