use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Commit classification following the conventional-commit taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    Feat,
    Fix,
    Docs,
    Chore,
    Refactor,
    Test,
    Style,
    Other,
}

impl CommitKind {
    /// Classify a commit message by its conventional-commit prefix.
    /// `fix(auth): ...`, `fix!: ...`, and `fix: ...` all classify as `Fix`.
    /// Messages without a recognized prefix classify as `Other`.
    pub fn classify(message: &str) -> Self {
        let head = message.trim_start();
        let prefix: String = head
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        // Require a prefix terminator so "fixture tests" is not a fix
        let terminated = head[prefix.len()..]
            .chars()
            .next()
            .map(|c| matches!(c, ':' | '(' | '!'))
            .unwrap_or(false);
        if !terminated {
            return Self::Other;
        }
        match prefix.as_str() {
            "feat" | "feature" => Self::Feat,
            "fix" | "bugfix" | "hotfix" => Self::Fix,
            "docs" | "doc" => Self::Docs,
            "chore" => Self::Chore,
            "refactor" => Self::Refactor,
            "test" | "tests" => Self::Test,
            "style" => Self::Style,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Docs => "docs",
            Self::Chore => "chore",
            Self::Refactor => "refactor",
            Self::Test => "test",
            Self::Style => "style",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for CommitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single commit as supplied by the external log reader.
/// Immutable once constructed; one NDJSON line in the per-project commit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub author: String,
    pub message: String,
    pub kind: CommitKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub deleted: u64,
}

impl Commit {
    pub fn is_fix(&self) -> bool {
        self.kind == CommitKind::Fix
    }

    /// Component this commit is attributed to: explicit scope wins,
    /// otherwise the message heuristic. `None` when neither yields a token.
    pub fn component(&self) -> Option<String> {
        match &self.scope {
            Some(s) if !s.trim().is_empty() => Some(s.trim().to_ascii_lowercase()),
            _ => crate::component::infer_component(&self.message),
        }
    }
}
