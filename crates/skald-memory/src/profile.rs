//! The user profile: the persistence container for both rolling memories.
//!
//! Loaded wholesale, mutated, saved wholesale; callers never hold a live
//! reference across invocations. Raw spiral and intervention events are
//! additionally appended to global NDJSON logs so the capped memories can
//! be rebuilt or audited later.

use crate::{InterventionMemory, InterventionRecord, PatternMemory};
use skald_segment::FixChain;
use skald_store::StorePaths;

pub const PROFILE_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub version: u32,
    #[serde(default)]
    pub pattern_memory: PatternMemory,
    #[serde(default)]
    pub intervention_memory: InterventionMemory,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION,
            pattern_memory: PatternMemory::default(),
            intervention_memory: InterventionMemory::default(),
        }
    }
}

impl Profile {
    /// Load the profile from `profile.json`, migrating older envelopes.
    /// Missing or corrupted files yield the default profile.
    pub fn load(paths: &StorePaths) -> anyhow::Result<Self> {
        skald_store::load_versioned(&paths.profile_json, PROFILE_VERSION, |_found, _value| {
            // v1 is the first envelope; nothing to rewrite yet
        })
    }

    /// Atomically save the profile under the store lock.
    pub fn save(&self, paths: &StorePaths) -> anyhow::Result<()> {
        paths.ensure_layout()?;
        let _lock = skald_store::lock_file(&paths.lock_file)?;
        skald_store::save_state(&paths.profile_json, self)
    }

    /// Record detected spirals: append each to the global raw log and
    /// update the rolling pattern memory.
    pub fn record_spirals(&mut self, paths: &StorePaths, chains: &[FixChain]) -> anyhow::Result<()> {
        for chain in chains.iter().filter(|c| c.is_spiral) {
            skald_store::append_line(&paths.spirals_ndjson, chain)?;
        }
        self.pattern_memory.record(chains);
        Ok(())
    }

    /// Record a remediation action: append to the global raw log and
    /// update the rolling intervention memory.
    pub fn record_intervention(
        &mut self,
        paths: &StorePaths,
        record: InterventionRecord,
    ) -> anyhow::Result<()> {
        skald_store::append_line(&paths.interventions_ndjson, &record)?;
        self.intervention_memory.record(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::SpiralPattern;
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    fn spiral(component: &str) -> FixChain {
        let ts = OffsetDateTime::parse("2026-03-02T09:00:00Z", &Rfc3339).unwrap();
        FixChain {
            component: component.to_string(),
            commit_count: 3,
            duration_minutes: 25,
            pattern: SpiralPattern::CredentialsAuth,
            is_spiral: true,
            first_ts: ts,
            last_ts: ts + time::Duration::minutes(25),
        }
    }

    fn store() -> (tempfile::TempDir, StorePaths) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = StorePaths::discover(tmp.path().join("store"));
        (tmp, paths)
    }

    #[test]
    fn load_missing_profile_is_default() {
        let (_tmp, paths) = store();
        let profile = Profile::load(&paths).unwrap();
        assert_eq!(profile.version, PROFILE_VERSION);
        assert!(profile.pattern_memory.records.is_empty());
    }

    #[test]
    fn save_load_round_trip() {
        let (_tmp, paths) = store();
        let mut profile = Profile::default();
        profile
            .record_spirals(&paths, &[spiral("auth")])
            .unwrap();
        profile.save(&paths).unwrap();

        let back = Profile::load(&paths).unwrap();
        assert_eq!(back.pattern_memory.records.len(), 1);
        assert_eq!(
            back.pattern_memory.occurrences(SpiralPattern::CredentialsAuth),
            1
        );
    }

    #[test]
    fn record_spirals_appends_raw_log() {
        let (_tmp, paths) = store();
        let mut profile = Profile::default();
        profile
            .record_spirals(&paths, &[spiral("auth"), spiral("gateway")])
            .unwrap();

        let (raw, stats) = skald_store::read_lines::<FixChain>(&paths.spirals_ndjson).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn record_intervention_appends_raw_log() {
        let (_tmp, paths) = store();
        let mut profile = Profile::default();
        profile
            .record_intervention(
                &paths,
                InterventionRecord {
                    kind: crate::kind::TRACER_TEST.to_string(),
                    pattern: SpiralPattern::CredentialsAuth,
                    component: "auth".to_string(),
                    duration_minutes: 20,
                    resolved: true,
                    notes: Some("wrote a probe test".to_string()),
                    date: "2026-03-02".to_string(),
                },
            )
            .unwrap();

        let (raw, _) =
            skald_store::read_lines::<InterventionRecord>(&paths.interventions_ndjson).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].kind, crate::kind::TRACER_TEST);
        assert_eq!(profile.intervention_memory.records.len(), 1);
    }

    #[test]
    fn corrupted_profile_yields_default_and_backup() {
        let (_tmp, paths) = store();
        paths.ensure_layout().unwrap();
        std::fs::write(&paths.profile_json, "{broken").unwrap();

        let profile = Profile::load(&paths).unwrap();
        assert!(profile.pattern_memory.records.is_empty());
        assert!(!paths.profile_json.exists());
    }
}
