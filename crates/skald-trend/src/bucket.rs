//! Weekly and monthly rollups over stored session records.
//!
//! Buckets are computed fresh from the record list every time trends are
//! requested; nothing here is persisted.

use serde::{Deserialize, Serialize};
use skald_history::SessionRecord;
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Weekly buckets retained, most recent last.
pub const WEEKLY_KEEP: usize = 12;
/// Monthly buckets retained, most recent last.
pub const MONTHLY_KEEP: usize = 6;

/// One ISO-week or calendar-month rollup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendBucket {
    /// `YYYY-Www` for weeks (ISO, Monday start) or `YYYY-MM` for months.
    pub key: String,
    pub session_count: usize,
    pub commit_count: usize,
    pub flow_state_count: usize,
    pub spiral_count: usize,
    pub avg_score: f64,
    pub active_minutes: i64,
}

impl TrendBucket {
    /// Spirals per session; zero when the bucket is empty.
    pub fn spiral_rate(&self) -> f64 {
        if self.session_count == 0 {
            0.0
        } else {
            self.spiral_count as f64 / self.session_count as f64
        }
    }

    /// Flow-state sessions per session; zero when the bucket is empty.
    pub fn flow_rate(&self) -> f64 {
        if self.session_count == 0 {
            0.0
        } else {
            self.flow_state_count as f64 / self.session_count as f64
        }
    }
}

/// Roll records into ISO-week buckets (Monday start), oldest first,
/// keeping the [`WEEKLY_KEEP`] most recent. Records with unparseable
/// timestamps are skipped.
pub fn weekly_trends(records: &[SessionRecord]) -> Vec<TrendBucket> {
    bucket_by(records, WEEKLY_KEEP, |ts| {
        let (year, week, _) = ts.date().to_iso_week_date();
        format!("{year:04}-W{week:02}")
    })
}

/// Roll records into calendar-month buckets, oldest first, keeping the
/// [`MONTHLY_KEEP`] most recent.
pub fn monthly_trends(records: &[SessionRecord]) -> Vec<TrendBucket> {
    bucket_by(records, MONTHLY_KEEP, |ts| {
        format!("{:04}-{:02}", ts.year(), u8::from(ts.month()))
    })
}

fn bucket_by(
    records: &[SessionRecord],
    keep: usize,
    key_of: impl Fn(OffsetDateTime) -> String,
) -> Vec<TrendBucket> {
    let mut buckets: BTreeMap<String, (TrendBucket, f64)> = BTreeMap::new();

    for record in records {
        let Ok(ts) = OffsetDateTime::parse(&record.ts, &Rfc3339) else {
            continue;
        };
        let key = key_of(ts);
        let (bucket, score_sum) = buckets
            .entry(key.clone())
            .or_insert_with(|| (TrendBucket { key, ..Default::default() }, 0.0));
        bucket.session_count += 1;
        bucket.commit_count += record.commit_count;
        bucket.spiral_count += record.spiral_count;
        bucket.active_minutes += record.active_minutes;
        if record.flow_state {
            bucket.flow_state_count += 1;
        }
        *score_sum += record.score;
    }

    let mut out: Vec<TrendBucket> = buckets
        .into_values()
        .map(|(mut bucket, score_sum)| {
            bucket.avg_score = score_sum / bucket.session_count as f64;
            bucket
        })
        .collect();
    if out.len() > keep {
        out.drain(..out.len() - keep);
    }
    out
}
