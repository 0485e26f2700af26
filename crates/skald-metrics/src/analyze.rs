use crate::metrics::{compute_session_metrics, SessionMetrics};
use crate::rating::Rating;
use serde::Serialize;
use skald_core::Commit;
use skald_segment::{segment_commits, Session, DEFAULT_GAP_MINUTES};

/// Options for a full commit-window analysis.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    /// Inter-commit gap that ends a session, in minutes.
    pub gap_minutes: i64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            gap_minutes: DEFAULT_GAP_MINUTES,
        }
    }
}

/// One segmented session with its metrics, ready for the CLI/dashboard.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session: Session,
    pub metrics: SessionMetrics,
    /// Sustained productive state: efficient flow at high velocity.
    pub flow_state: bool,
}

/// Segment a commit list, detect chains, and compute per-session metrics.
/// This is the engine's main entry point for consumers.
pub fn analyze_commits(commits: Vec<Commit>, opts: &AnalyzeOptions) -> Vec<SessionReport> {
    segment_commits(commits, opts.gap_minutes)
        .into_iter()
        .map(|session| {
            let metrics = compute_session_metrics(&session);
            let flow_state = metrics.flow_efficiency.rating == Rating::Elite
                && metrics.iteration_velocity.rating >= Rating::High;
            SessionReport {
                session,
                metrics,
                flow_state,
            }
        })
        .collect()
}

/// Compact per-session summary row for rendering layers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub start: String,
    pub end: String,
    pub duration_minutes: i64,
    pub commit_count: usize,
    pub spiral_count: usize,
    pub score: f64,
    pub code_health: Rating,
    pub flow_state: bool,
}

impl SessionSummary {
    pub fn from_report(report: &SessionReport) -> Self {
        let fmt = time::format_description::well_known::Rfc3339;
        Self {
            start: report.session.start.format(&fmt).unwrap_or_default(),
            end: report.session.end.format(&fmt).unwrap_or_default(),
            duration_minutes: report.session.duration_minutes(),
            commit_count: report.session.commits.len(),
            spiral_count: report.session.spiral_count(),
            score: report.metrics.score(),
            code_health: report.metrics.code_health,
            flow_state: report.flow_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::CommitKind;
    use time::format_description::well_known::Rfc3339;
    use time::{Duration, OffsetDateTime};

    fn commit_at(minutes: i64, kind: CommitKind, message: &str) -> Commit {
        let base = OffsetDateTime::parse("2026-03-02T09:00:00Z", &Rfc3339).unwrap();
        Commit {
            hash: format!("c{minutes:06}"),
            ts: base + Duration::minutes(minutes),
            author: "dev".to_string(),
            message: message.to_string(),
            kind,
            scope: None,
            files: vec![],
            added: 10,
            deleted: 2,
        }
    }

    #[test]
    fn analyze_empty_commits() {
        assert!(analyze_commits(vec![], &AnalyzeOptions::default()).is_empty());
    }

    #[test]
    fn analyze_splits_sessions_and_attaches_metrics() {
        let mut commits = Vec::new();
        for m in [0, 10, 20, 30] {
            commits.push(commit_at(m, CommitKind::Feat, "feat: work"));
        }
        commits.push(commit_at(300, CommitKind::Feat, "feat: later"));

        let reports = analyze_commits(commits, &AnalyzeOptions::default());
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].session.commits.len(), 4);
        // 4 commits in 30 minutes -> 8/hr, no fixes, no spirals
        assert_eq!(reports[0].metrics.code_health, Rating::Elite);
        assert!(reports[0].flow_state);
    }

    #[test]
    fn spiral_session_is_not_flow_state() {
        let commits = vec![
            commit_at(0, CommitKind::Fix, "fix: auth token"),
            commit_at(20, CommitKind::Fix, "fix: auth refresh"),
            commit_at(40, CommitKind::Fix, "fix: auth skew"),
        ];
        let reports = analyze_commits(commits, &AnalyzeOptions::default());
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].session.spiral_count(), 1);
        // 40 of 40 active minutes inside the spiral
        assert_eq!(reports[0].metrics.flow_efficiency.value, 0.0);
        assert!(!reports[0].flow_state);
    }

    #[test]
    fn summary_row_matches_report() {
        let commits = vec![
            commit_at(0, CommitKind::Feat, "feat: a"),
            commit_at(15, CommitKind::Feat, "feat: b"),
        ];
        let reports = analyze_commits(commits, &AnalyzeOptions::default());
        let summary = SessionSummary::from_report(&reports[0]);
        assert_eq!(summary.commit_count, 2);
        assert_eq!(summary.duration_minutes, 15);
        assert_eq!(summary.spiral_count, 0);
        assert!(summary.start.starts_with("2026-03-02T09:00"));
    }
}
