//! Per-repository append-only commit log.
//!
//! One compressed record per analyzed commit, so later invocations (and
//! the trend layer) can re-read what the engine has already seen without
//! consulting the version-control system again.

use skald_core::Commit;
use skald_store::{ReadStats, StorePaths};
use std::path::PathBuf;

pub struct CommitLog {
    path: PathBuf,
}

impl CommitLog {
    pub fn open(paths: &StorePaths, project_id: &str) -> Self {
        Self {
            path: paths.project_commits(project_id),
        }
    }

    /// Append commits in the order given.
    pub fn append(&self, commits: &[Commit]) -> anyhow::Result<()> {
        for commit in commits {
            skald_store::append_line(&self.path, commit)?;
        }
        Ok(())
    }

    /// Read back every parseable commit, with skip counts for the caller
    /// to report.
    pub fn read(&self) -> anyhow::Result<(Vec<Commit>, ReadStats)> {
        skald_store::read_lines(&self.path)
    }

    /// Hash of the most recently appended commit, if any.
    pub fn last_hash(&self) -> anyhow::Result<Option<String>> {
        let (commits, _) = self.read()?;
        Ok(commits.last().map(|c| c.hash.clone()))
    }
}
