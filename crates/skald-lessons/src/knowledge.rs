//! Fixed per-pattern knowledge: root causes and prevention steps that
//! seed newly synthesized lessons.

use skald_core::SpiralPattern;

#[derive(Debug, Clone, Copy)]
pub struct PatternKnowledge {
    pub root_cause: &'static str,
    pub prevention: &'static [&'static str],
}

pub fn knowledge_for(pattern: SpiralPattern) -> PatternKnowledge {
    match pattern {
        SpiralPattern::CredentialsAuth => PatternKnowledge {
            root_cause: "Credentials or tokens assumed valid without verification; \
                         expiry and scope mismatches surface only at call time.",
            prevention: &[
                "Verify the credential works with a direct probe before wiring it in",
                "Check token expiry and scopes first, not last",
                "Keep one source of truth for secrets per environment",
            ],
        },
        SpiralPattern::VolumePermissions => PatternKnowledge {
            root_cause: "Filesystem ownership or mount configuration differs between \
                         the build environment and the runtime environment.",
            prevention: &[
                "Confirm uid/gid and mode on the mounted path before starting the service",
                "Reproduce the mount locally instead of editing live",
                "Document the expected ownership next to the mount definition",
            ],
        },
        SpiralPattern::ApiSchema => PatternKnowledge {
            root_cause: "Producer and consumer disagree about the shape or version \
                         of the contract; changes shipped without a compatibility check.",
            prevention: &[
                "Diff the actual payload against the expected schema before coding the fix",
                "Pin and verify API versions explicitly",
                "Add a contract test at the integration boundary",
            ],
        },
        SpiralPattern::TlsCertificates => PatternKnowledge {
            root_cause: "Certificate chain, hostname, or trust store assumptions that \
                         do not hold in the failing environment.",
            prevention: &[
                "Inspect the served chain with one openssl command before changing code",
                "Check expiry dates and SANs first",
                "Keep CA bundles versioned with the deployment",
            ],
        },
        SpiralPattern::ImageRegistry => PatternKnowledge {
            root_cause: "The image reference does not resolve to what was built: \
                         stale tags, wrong registry, or missing pull credentials.",
            prevention: &[
                "Pull the exact reference locally before deploying it",
                "Prefer digests over mutable tags for deployments",
                "Verify registry credentials in the target namespace",
            ],
        },
        SpiralPattern::GitopsDrift => PatternKnowledge {
            root_cause: "Cluster state and declared state diverged; manual edits or \
                         failed syncs left the declared source behind.",
            prevention: &[
                "Compare live state against the declared source before editing either",
                "Let the sync tool converge instead of patching the cluster by hand",
                "Alert on drift instead of discovering it mid-incident",
            ],
        },
        SpiralPattern::Other => PatternKnowledge {
            root_cause: "Repeated fixes to one component without a verified hypothesis \
                         about the underlying failure.",
            prevention: &[
                "State the hypothesis before the next fix attempt",
                "Write a tracer test that fails for the suspected reason",
                "Step away after two failed attempts and re-read the error from scratch",
            ],
        },
    }
}
