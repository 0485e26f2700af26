use std::path::{Path, PathBuf};

/// All well-known paths under the skald store root.
///
/// Pattern memory, intervention memory, and lessons are global (they
/// accumulate across repositories); commit logs and session history are
/// per-project under `projects/<id>/`.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub profile_json: PathBuf,
    pub lessons_json: PathBuf,
    pub spirals_ndjson: PathBuf,
    pub interventions_ndjson: PathBuf,
    pub projects_dir: PathBuf,
    pub lock_file: PathBuf,
}

impl StorePaths {
    /// Derive all paths from a store root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            profile_json: root.join("profile.json"),
            lessons_json: root.join("lessons.json"),
            spirals_ndjson: root.join("spirals.ndjson"),
            interventions_ndjson: root.join("interventions.ndjson"),
            projects_dir: root.join("projects"),
            lock_file: root.join("LOCK"),
            root,
        }
    }

    /// Default per-user store root: `<data dir>/skald`, falling back to
    /// `~/.skald` when the platform data dir is unavailable.
    pub fn default_root() -> PathBuf {
        if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("skald")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".skald")
        } else {
            PathBuf::from(".skald-store")
        }
    }

    /// Create the root and projects directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.projects_dir)?;
        Ok(())
    }

    /// Per-project directory under `projects/<id>/`.
    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.projects_dir.join(project_id)
    }

    /// Per-project compressed commit log.
    pub fn project_commits(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("commits.ndjson")
    }

    /// Per-project session record history.
    pub fn project_history(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("history.json")
    }
}

/// Compute a deterministic project ID from a repo root path.
/// project_id = blake3(normalize_path(input)) hex, first 32 chars.
pub fn project_id(repo_root: &Path) -> String {
    let normalized = normalize_path(repo_root);
    let hash = blake3::hash(normalized.as_bytes());
    hash.to_hex()[..32].to_string()
}

/// Normalize a path: canonicalize, lowercase on Windows, forward slashes.
fn normalize_path(p: &Path) -> String {
    let abs = p
        .canonicalize()
        .unwrap_or_else(|_| p.to_path_buf())
        .to_string_lossy()
        .to_string();
    #[cfg(windows)]
    let abs = abs.to_lowercase();
    abs.replace('\\', "/")
}
