use crate::spiral::{detect_chains, FixChain};
use skald_core::Commit;
use time::{Duration, OffsetDateTime};

/// Default inter-commit gap that ends a session, in minutes.
pub const DEFAULT_GAP_MINUTES: i64 = 90;

/// A maximal run of commits with no internal gap above the threshold.
/// Read-only after construction.
#[derive(Debug, Clone)]
pub struct Session {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub commits: Vec<Commit>,
    pub chains: Vec<FixChain>,
}

impl Session {
    /// Wall-clock span of the session. A single-commit session has
    /// duration zero.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).whole_minutes()
    }

    pub fn spirals(&self) -> impl Iterator<Item = &FixChain> {
        self.chains.iter().filter(|c| c.is_spiral)
    }

    pub fn spiral_count(&self) -> usize {
        self.spirals().count()
    }

    /// Total minutes spent inside spirals during this session.
    pub fn spiral_minutes(&self) -> i64 {
        self.spirals().map(|s| s.duration_minutes).sum()
    }

    pub fn fix_count(&self) -> usize {
        self.commits.iter().filter(|c| c.is_fix()).count()
    }
}

/// Partition commits into sessions using the gap threshold. Input is
/// sorted defensively; callers may pass commits in any order. A gap
/// strictly greater than `gap_minutes` starts a new session.
pub fn segment_commits(mut commits: Vec<Commit>, gap_minutes: i64) -> Vec<Session> {
    commits.sort_by_key(|c| c.ts);
    let gap = Duration::minutes(gap_minutes.max(0));

    let mut sessions = Vec::new();
    let mut current: Vec<Commit> = Vec::new();
    for commit in commits {
        if let Some(last) = current.last() {
            if commit.ts - last.ts > gap {
                sessions.push(build_session(std::mem::take(&mut current)));
            }
        }
        current.push(commit);
    }
    if !current.is_empty() {
        sessions.push(build_session(current));
    }
    sessions
}

fn build_session(commits: Vec<Commit>) -> Session {
    let start = commits
        .first()
        .map(|c| c.ts)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let end = commits.last().map(|c| c.ts).unwrap_or(start);
    let chains = detect_chains(&commits);
    Session {
        start,
        end,
        commits,
        chains,
    }
}

/// Summary statistics over a segmentation result, consumed by the
/// external dashboard.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SegmentStats {
    pub session_count: usize,
    pub avg_duration_minutes: f64,
    pub median_duration_minutes: f64,
    pub avg_commits_per_session: f64,
}

impl SegmentStats {
    pub fn from_sessions(sessions: &[Session]) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }
        let mut durations: Vec<i64> = sessions.iter().map(|s| s.duration_minutes()).collect();
        durations.sort_unstable();
        let n = durations.len();
        let median = if n % 2 == 1 {
            durations[n / 2] as f64
        } else {
            (durations[n / 2 - 1] + durations[n / 2]) as f64 / 2.0
        };
        let total_minutes: i64 = durations.iter().sum();
        let total_commits: usize = sessions.iter().map(|s| s.commits.len()).sum();
        Self {
            session_count: n,
            avg_duration_minutes: total_minutes as f64 / n as f64,
            median_duration_minutes: median,
            avg_commits_per_session: total_commits as f64 / n as f64,
        }
    }
}
