//! Spiral pattern classification.
//!
//! A fix chain is tagged with a category by matching its concatenated commit
//! messages against a fixed, ordered rule table. First match wins; no match
//! yields [`SpiralPattern::Other`]. Keyword matching has a known
//! false-negative risk for messages that describe a failure without naming
//! its domain.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category tag assigned to a debug spiral.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SpiralPattern {
    CredentialsAuth,
    VolumePermissions,
    ApiSchema,
    TlsCertificates,
    ImageRegistry,
    GitopsDrift,
    Other,
}

impl SpiralPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialsAuth => "credentials_auth",
            Self::VolumePermissions => "volume_permissions",
            Self::ApiSchema => "api_schema",
            Self::TlsCertificates => "tls_certificates",
            Self::ImageRegistry => "image_registry",
            Self::GitopsDrift => "gitops_drift",
            Self::Other => "other",
        }
    }

    /// Human-readable label used in lesson titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CredentialsAuth => "credentials/auth",
            Self::VolumePermissions => "volume/permissions",
            Self::ApiSchema => "API/schema mismatch",
            Self::TlsCertificates => "TLS/certificates",
            Self::ImageRegistry => "image/registry",
            Self::GitopsDrift => "GitOps drift",
            Self::Other => "uncategorized",
        }
    }

    /// All categories the rule table can produce, in rule order.
    pub fn all() -> &'static [SpiralPattern] {
        &[
            Self::CredentialsAuth,
            Self::VolumePermissions,
            Self::ApiSchema,
            Self::TlsCertificates,
            Self::ImageRegistry,
            Self::GitopsDrift,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for SpiralPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered rule table: (category, keyword alternation). Evaluated top to
/// bottom; a chain that mentions both auth and TLS is credentials/auth.
const RULES: &[(SpiralPattern, &str)] = &[
    (
        SpiralPattern::CredentialsAuth,
        r"(?i)\b(credential|auth|token|password|secret|api.?key|login|oauth|unauthorized|forbidden)\b",
    ),
    (
        SpiralPattern::VolumePermissions,
        r"(?i)\b(volume|mount|permission|chmod|chown|read.?only|pvc|denied)\b",
    ),
    (
        SpiralPattern::ApiSchema,
        r"(?i)\b(api|schema|version|endpoint|contract|migration|payload|deserializ\w*)\b",
    ),
    (
        SpiralPattern::TlsCertificates,
        r"(?i)\b(tls|ssl|cert|certificate|certs|x509|handshake)\b",
    ),
    (
        SpiralPattern::ImageRegistry,
        r"(?i)\b(image|registry|docker|tag|manifest|imagepull|pull.?backoff)\b",
    ),
    (
        SpiralPattern::GitopsDrift,
        r"(?i)\b(drift|gitops|argo.?cd|flux|out.?of.?sync|reconcil\w*)\b",
    ),
];

/// Classify the concatenated commit messages of a fix chain.
pub fn classify_messages(joined: &str) -> SpiralPattern {
    for (pattern, rule) in RULES {
        let re = Regex::new(rule).expect("rule table regex is valid");
        if re.is_match(joined) {
            return *pattern;
        }
    }
    SpiralPattern::Other
}
