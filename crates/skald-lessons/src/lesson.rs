use serde::{Deserialize, Serialize};
use skald_core::SpiralPattern;
use std::collections::BTreeMap;

pub const LESSONS_VERSION: u32 = 1;
/// Maximum lessons retained in the database.
pub const LESSONS_CAP: usize = 100;
/// Synthesis run log entries retained.
pub const SYNTHESIS_LOG_CAP: usize = 10;

/// Severity tier derived from total time wasted on a pattern.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Per-intervention effectiveness attached to a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionStat {
    #[serde(rename = "type")]
    pub kind: String,
    pub success_count: u64,
    pub total_count: u64,
    /// success_count / total_count * 100
    pub effectiveness: f64,
}

impl InterventionStat {
    pub fn new(kind: impl Into<String>, success_count: u64, total_count: u64) -> Self {
        let effectiveness = if total_count == 0 {
            0.0
        } else {
            success_count as f64 / total_count as f64 * 100.0
        };
        Self {
            kind: kind.into(),
            success_count,
            total_count,
            effectiveness,
        }
    }
}

/// A persistent, confidence-scored record synthesized from repeated
/// pattern occurrences plus observed remediation effectiveness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
    pub pattern: SpiralPattern,
    pub components: Vec<String>,
    pub title: String,
    pub description: String,
    pub root_cause: String,
    pub prevention: Vec<String>,
    /// Sorted by effectiveness, descending.
    pub interventions: Vec<InterventionStat>,
    /// 0..=100
    pub confidence: u8,
    pub evidence_count: u64,
    pub time_wasted_minutes: i64,
    pub severity: Severity,
    #[serde(default)]
    pub applied: bool,
    #[serde(default)]
    pub dismissed: bool,
    /// User-reported effectiveness (0..=100) when applied or dismissed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_effectiveness: Option<u8>,
}

/// Record of one synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRun {
    pub id: String,
    pub ts: String,
    pub lessons_created: usize,
    pub lessons_updated: usize,
    pub patterns_processed: usize,
}

/// Summary statistics, recomputed on every write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonsStats {
    pub total: usize,
    pub applied: usize,
    pub dismissed: usize,
    pub avg_confidence: f64,
    #[serde(default)]
    pub by_severity: BTreeMap<Severity, usize>,
}

/// All lessons plus the pattern index, stats, and synthesis log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonsDatabase {
    pub version: u32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    /// pattern -> lesson ids; rebuilt on every write, never patched.
    #[serde(default)]
    pub pattern_index: BTreeMap<SpiralPattern, Vec<String>>,
    #[serde(default)]
    pub stats: LessonsStats,
    #[serde(default)]
    pub synthesis_log: Vec<SynthesisRun>,
}

impl Default for LessonsDatabase {
    fn default() -> Self {
        Self {
            version: LESSONS_VERSION,
            lessons: Vec::new(),
            pattern_index: BTreeMap::new(),
            stats: LessonsStats::default(),
            synthesis_log: Vec::new(),
        }
    }
}

impl LessonsDatabase {
    pub fn load(paths: &skald_store::StorePaths) -> anyhow::Result<Self> {
        skald_store::load_versioned(&paths.lessons_json, LESSONS_VERSION, |_found, _value| {
            // v1 is the first envelope; nothing to rewrite yet
        })
    }

    pub fn save(&self, paths: &skald_store::StorePaths) -> anyhow::Result<()> {
        paths.ensure_layout()?;
        let _lock = skald_store::lock_file(&paths.lock_file)?;
        skald_store::save_state(&paths.lessons_json, self)
    }

    /// The active (non-dismissed) lesson for a pattern, if any. Dismissed
    /// lessons are retained but excluded from synthesis targeting.
    pub fn active_lesson_mut(&mut self, pattern: SpiralPattern) -> Option<&mut Lesson> {
        self.lessons
            .iter_mut()
            .find(|l| l.pattern == pattern && !l.dismissed)
    }

    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Mark a lesson as applied, with optional user-reported
    /// effectiveness. Returns false when the id is unknown.
    pub fn apply_lesson(&mut self, id: &str, effectiveness: Option<u8>) -> bool {
        let Some(lesson) = self.lessons.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        lesson.applied = true;
        if effectiveness.is_some() {
            lesson.reported_effectiveness = effectiveness.map(|e| e.min(100));
        }
        self.finish_write();
        true
    }

    /// Mark a lesson as dismissed. Dismissed lessons drop out of
    /// synthesis targeting and are first to go when the cap trims.
    pub fn dismiss_lesson(&mut self, id: &str, effectiveness: Option<u8>) -> bool {
        let Some(lesson) = self.lessons.iter_mut().find(|l| l.id == id) else {
            return false;
        };
        lesson.dismissed = true;
        if effectiveness.is_some() {
            lesson.reported_effectiveness = effectiveness.map(|e| e.min(100));
        }
        self.finish_write();
        true
    }

    /// Trim to the cap, rebuild the index, recompute stats. Called after
    /// every mutation.
    pub(crate) fn finish_write(&mut self) {
        self.trim();
        self.rebuild_index();
        self.recompute_stats();
    }

    /// Keep the top [`LESSONS_CAP`] lessons. Drop priority: dismissed
    /// first, then lowest confidence, then lowest evidence, then oldest
    /// update.
    fn trim(&mut self) {
        if self.lessons.len() <= LESSONS_CAP {
            return;
        }
        self.lessons.sort_by(|a, b| {
            a.dismissed
                .cmp(&b.dismissed)
                .then_with(|| b.confidence.cmp(&a.confidence))
                .then_with(|| b.evidence_count.cmp(&a.evidence_count))
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        let dropped = self.lessons.len() - LESSONS_CAP;
        self.lessons.truncate(LESSONS_CAP);
        tracing::info!(dropped, "trimmed lessons database to cap");
    }

    fn rebuild_index(&mut self) {
        let mut index: BTreeMap<SpiralPattern, Vec<String>> = BTreeMap::new();
        for lesson in &self.lessons {
            index.entry(lesson.pattern).or_default().push(lesson.id.clone());
        }
        self.pattern_index = index;
    }

    fn recompute_stats(&mut self) {
        let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        for lesson in &self.lessons {
            *by_severity.entry(lesson.severity).or_insert(0) += 1;
        }
        let total = self.lessons.len();
        let avg_confidence = if total == 0 {
            0.0
        } else {
            self.lessons.iter().map(|l| l.confidence as f64).sum::<f64>() / total as f64
        };
        self.stats = LessonsStats {
            total,
            applied: self.lessons.iter().filter(|l| l.applied).count(),
            dismissed: self.lessons.iter().filter(|l| l.dismissed).count(),
            avg_confidence,
            by_severity,
        };
    }

    /// Append a synthesis run entry, keeping the most recent
    /// [`SYNTHESIS_LOG_CAP`].
    pub(crate) fn log_run(&mut self, run: SynthesisRun) {
        self.synthesis_log.push(run);
        if self.synthesis_log.len() > SYNTHESIS_LOG_CAP {
            let excess = self.synthesis_log.len() - SYNTHESIS_LOG_CAP;
            self.synthesis_log.drain(..excess);
        }
    }
}
