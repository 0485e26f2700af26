//! Weekly-retrospective lesson synthesis.
//!
//! For every pattern with enough accumulated evidence, either create a new
//! lesson (seeded from the knowledge table) or update the existing active
//! one. Dismissed lessons are never updated; the pattern gets a fresh
//! lesson instead.

use crate::knowledge::knowledge_for;
use crate::lesson::{
    InterventionStat, Lesson, LessonsDatabase, Severity, SynthesisRun,
};
use skald_core::SpiralPattern;
use skald_memory::{InterventionMemory, PatternMemory};
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Minimum occurrences of a pattern before it yields a lesson.
pub const SYNTHESIS_THRESHOLD: u64 = 2;

/// Run one synthesis pass over the memories, mutating the database in
/// place. Returns the run entry that was also appended to the log.
pub fn synthesize(
    patterns: &PatternMemory,
    interventions: &InterventionMemory,
    db: &mut LessonsDatabase,
    now: OffsetDateTime,
) -> SynthesisRun {
    let mut created = 0usize;
    let mut updated = 0usize;
    let mut processed = 0usize;

    for (&pattern, &count) in &patterns.aggregates.count_by_pattern {
        if count < SYNTHESIS_THRESHOLD {
            continue;
        }
        processed += 1;

        let minutes = patterns.minutes_wasted(pattern);
        let components = patterns.components_for(pattern);
        let stats = intervention_stats(interventions, pattern);

        match db.active_lesson_mut(pattern) {
            Some(lesson) => {
                update_lesson(lesson, count, minutes, &components, stats, now);
                updated += 1;
            }
            None => {
                db.lessons
                    .push(create_lesson(pattern, count, minutes, components, stats, now));
                created += 1;
            }
        }
    }

    db.finish_write();
    let run = SynthesisRun {
        id: format!("run_{}", ulid::Ulid::new().to_string().to_lowercase()),
        ts: fmt_rfc3339(now),
        lessons_created: created,
        lessons_updated: updated,
        patterns_processed: processed,
    };
    db.log_run(run.clone());
    tracing::info!(
        created,
        updated,
        processed,
        "lesson synthesis run complete"
    );
    run
}

/// Effectiveness stats for all interventions recorded against a pattern,
/// sorted by effectiveness descending.
fn intervention_stats(
    interventions: &InterventionMemory,
    pattern: SpiralPattern,
) -> Vec<InterventionStat> {
    let mut by_kind: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for record in interventions.records_for(pattern) {
        let entry = by_kind.entry(record.kind.as_str()).or_insert((0, 0));
        entry.1 += 1;
        if record.resolved {
            entry.0 += 1;
        }
    }
    let mut stats: Vec<InterventionStat> = by_kind
        .into_iter()
        .map(|(kind, (successes, uses))| InterventionStat::new(kind, successes, uses))
        .collect();
    sort_by_effectiveness(&mut stats);
    stats
}

fn sort_by_effectiveness(stats: &mut [InterventionStat]) {
    stats.sort_by(|a, b| {
        b.effectiveness
            .partial_cmp(&a.effectiveness)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.kind.cmp(&b.kind))
    });
}

/// confidence = 50 + min(25, evidence*5) + 15 if any intervention is
/// proven (>70% effective) + 10 if the lesson was applied. Capped at 100.
fn confidence(evidence: u64, interventions: &[InterventionStat], applied: bool) -> u8 {
    let mut c = 50.0 + (evidence as f64 * 5.0).min(25.0);
    if interventions.iter().any(|i| i.effectiveness > 70.0) {
        c += 15.0;
    }
    if applied {
        c += 10.0;
    }
    c.min(100.0) as u8
}

fn severity(time_wasted_minutes: i64) -> Severity {
    if time_wasted_minutes > 120 {
        Severity::Critical
    } else if time_wasted_minutes > 60 {
        Severity::High
    } else if time_wasted_minutes > 30 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn create_lesson(
    pattern: SpiralPattern,
    evidence: u64,
    minutes: i64,
    components: Vec<String>,
    interventions: Vec<InterventionStat>,
    now: OffsetDateTime,
) -> Lesson {
    let knowledge = knowledge_for(pattern);
    let ts = fmt_rfc3339(now);
    Lesson {
        id: format!("lsn_{}", ulid::Ulid::new().to_string().to_lowercase()),
        version: 1,
        created_at: ts.clone(),
        updated_at: ts,
        pattern,
        title: format!("Recurring {} debug spiral", pattern.label()),
        description: render_description(pattern, evidence, minutes, &components, &interventions),
        root_cause: knowledge.root_cause.to_string(),
        prevention: knowledge.prevention.iter().map(|s| s.to_string()).collect(),
        confidence: confidence(evidence, &interventions, false),
        evidence_count: evidence,
        time_wasted_minutes: minutes,
        severity: severity(minutes),
        components,
        interventions,
        applied: false,
        dismissed: false,
        reported_effectiveness: None,
    }
}

fn update_lesson(
    lesson: &mut Lesson,
    evidence: u64,
    minutes: i64,
    components: &[String],
    fresh_stats: Vec<InterventionStat>,
    now: OffsetDateTime,
) {
    // Union the affected components
    for component in components {
        if !lesson.components.contains(component) {
            lesson.components.push(component.clone());
        }
    }
    lesson.components.sort();

    // Merge intervention counts per type: sum successes and totals, then
    // recompute effectiveness. The rolling memory forgets old records;
    // the lesson keeps their weight.
    let mut merged: BTreeMap<String, (u64, u64)> = lesson
        .interventions
        .iter()
        .map(|s| (s.kind.clone(), (s.success_count, s.total_count)))
        .collect();
    for stat in fresh_stats {
        let entry = merged.entry(stat.kind.clone()).or_insert((0, 0));
        entry.0 += stat.success_count;
        entry.1 += stat.total_count;
    }
    lesson.interventions = merged
        .into_iter()
        .map(|(kind, (successes, uses))| InterventionStat::new(kind, successes, uses))
        .collect();
    sort_by_effectiveness(&mut lesson.interventions);

    lesson.evidence_count = evidence;
    lesson.time_wasted_minutes = minutes;
    lesson.confidence = confidence(evidence, &lesson.interventions, lesson.applied);
    lesson.severity = severity(minutes);
    lesson.description = render_description(
        lesson.pattern,
        evidence,
        minutes,
        &lesson.components,
        &lesson.interventions,
    );
    lesson.version += 1;
    lesson.updated_at = fmt_rfc3339(now);
}

fn render_description(
    pattern: SpiralPattern,
    evidence: u64,
    minutes: i64,
    components: &[String],
    interventions: &[InterventionStat],
) -> String {
    let comps = if components.is_empty() {
        "unattributed components".to_string()
    } else {
        components.join(", ")
    };
    let mut text = format!(
        "{} spirals seen {} times, costing roughly {} minutes, in: {}.",
        pattern.label(),
        evidence,
        minutes,
        comps
    );
    if let Some(best) = interventions.first() {
        if best.total_count > 0 {
            text.push_str(&format!(
                " Most effective response so far: {} ({:.0}% success over {} uses).",
                best.kind, best.effectiveness, best.total_count
            ));
        }
    }
    text
}

fn fmt_rfc3339(now: OffsetDateTime) -> String {
    now.format(&Rfc3339)
        .expect("RFC3339 formatting should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_memory::InterventionRecord;
    use skald_segment::FixChain;

    fn now() -> OffsetDateTime {
        OffsetDateTime::parse("2026-03-08T12:00:00Z", &Rfc3339).unwrap()
    }

    fn spiral(message: &str, component: &str, minutes: i64) -> FixChain {
        let ts = now();
        FixChain {
            component: component.to_string(),
            commit_count: 3,
            duration_minutes: minutes,
            pattern: skald_core::pattern::classify_messages(message),
            is_spiral: true,
            first_ts: ts,
            last_ts: ts,
        }
    }

    fn auth_memory(occurrences: usize, minutes_each: i64) -> PatternMemory {
        let mut memory = PatternMemory::default();
        let spirals: Vec<FixChain> = (0..occurrences)
            .map(|_| spiral("fix: auth token", "auth", minutes_each))
            .collect();
        memory.record(&spirals);
        memory
    }

    fn intervention(kind: &str, resolved: bool) -> InterventionRecord {
        InterventionRecord {
            kind: kind.to_string(),
            pattern: SpiralPattern::CredentialsAuth,
            component: "auth".to_string(),
            duration_minutes: 20,
            resolved,
            notes: None,
            date: "2026-03-02".to_string(),
        }
    }

    #[test]
    fn below_threshold_creates_nothing() {
        let patterns = auth_memory(1, 20);
        let mut db = LessonsDatabase::default();
        let run = synthesize(&patterns, &InterventionMemory::default(), &mut db, now());
        assert_eq!(run.patterns_processed, 0);
        assert!(db.lessons.is_empty());
    }

    #[test]
    fn at_threshold_creates_a_lesson() {
        let patterns = auth_memory(2, 20);
        let mut db = LessonsDatabase::default();
        let run = synthesize(&patterns, &InterventionMemory::default(), &mut db, now());
        assert_eq!(run.lessons_created, 1);
        assert_eq!(run.lessons_updated, 0);

        let lesson = &db.lessons[0];
        assert_eq!(lesson.pattern, SpiralPattern::CredentialsAuth);
        assert!(lesson.id.starts_with("lsn_"));
        assert_eq!(lesson.evidence_count, 2);
        assert_eq!(lesson.time_wasted_minutes, 40);
        assert_eq!(lesson.severity, Severity::Medium);
        // 50 + min(25, 10) = 60, no interventions, never applied
        assert_eq!(lesson.confidence, 60);
        assert!(!lesson.root_cause.is_empty());
        assert!(!lesson.prevention.is_empty());
        assert_eq!(lesson.components, vec!["auth".to_string()]);
        assert_eq!(db.synthesis_log.len(), 1);
    }

    #[test]
    fn confidence_monotone_in_evidence_and_capped() {
        let none: Vec<InterventionStat> = vec![];
        let c2 = confidence(2, &none, false);
        let c5 = confidence(5, &none, false);
        assert!(c5 >= c2);
        assert_eq!(c2, 60);
        assert_eq!(c5, 75);
        // evidence bonus caps at 25
        assert_eq!(confidence(50, &none, false), 75);

        let proven = vec![InterventionStat::new("revert", 8, 10)];
        assert_eq!(confidence(50, &proven, true), 100);
        assert!(confidence(u64::MAX / 8, &proven, true) <= 100);
    }

    #[test]
    fn proven_intervention_adds_fifteen() {
        let weak = vec![InterventionStat::new("revert", 1, 2)]; // 50%
        let proven = vec![InterventionStat::new("revert", 9, 10)]; // 90%
        assert_eq!(confidence(2, &weak, false), 60);
        assert_eq!(confidence(2, &proven, false), 75);
    }

    #[test]
    fn severity_tiers() {
        assert_eq!(severity(20), Severity::Low);
        assert_eq!(severity(31), Severity::Medium);
        assert_eq!(severity(61), Severity::High);
        assert_eq!(severity(121), Severity::Critical);
        assert_eq!(severity(120), Severity::High);
    }

    #[test]
    fn second_run_updates_instead_of_duplicating() {
        let mut db = LessonsDatabase::default();
        let interventions = InterventionMemory::default();

        synthesize(&auth_memory(2, 20), &interventions, &mut db, now());
        assert_eq!(db.lessons.len(), 1);
        let created_version = db.lessons[0].version;

        let run = synthesize(&auth_memory(4, 20), &interventions, &mut db, now());
        assert_eq!(run.lessons_created, 0);
        assert_eq!(run.lessons_updated, 1);
        assert_eq!(db.lessons.len(), 1);
        assert_eq!(db.lessons[0].evidence_count, 4);
        assert_eq!(db.lessons[0].version, created_version + 1);
        assert_eq!(db.lessons[0].confidence, 70);
    }

    #[test]
    fn update_unions_components() {
        let mut db = LessonsDatabase::default();
        let interventions = InterventionMemory::default();
        synthesize(&auth_memory(2, 20), &interventions, &mut db, now());

        let mut memory = PatternMemory::default();
        memory.record(&[
            spiral("fix: auth token", "gateway", 20),
            spiral("fix: auth cookie", "gateway", 20),
        ]);
        synthesize(&memory, &interventions, &mut db, now());
        assert_eq!(
            db.lessons[0].components,
            vec!["auth".to_string(), "gateway".to_string()]
        );
    }

    #[test]
    fn update_merges_intervention_counts() {
        let mut db = LessonsDatabase::default();
        let mut interventions = InterventionMemory::default();
        interventions.record(intervention("revert", true));
        interventions.record(intervention("revert", false));

        synthesize(&auth_memory(2, 20), &interventions, &mut db, now());
        assert_eq!(db.lessons[0].interventions.len(), 1);
        assert_eq!(db.lessons[0].interventions[0].total_count, 2);
        assert_eq!(db.lessons[0].interventions[0].success_count, 1);

        interventions.record(intervention("revert", true));
        synthesize(&auth_memory(3, 20), &interventions, &mut db, now());
        // Existing (1/2) merged with fresh (2/3)
        let stat = &db.lessons[0].interventions[0];
        assert_eq!(stat.total_count, 5);
        assert_eq!(stat.success_count, 3);
        assert_eq!(stat.effectiveness, 60.0);
    }

    #[test]
    fn dismissed_lesson_gets_a_fresh_replacement() {
        let mut db = LessonsDatabase::default();
        let interventions = InterventionMemory::default();
        synthesize(&auth_memory(2, 20), &interventions, &mut db, now());
        let old_id = db.lessons[0].id.clone();
        db.dismiss_lesson(&old_id, Some(10));

        let run = synthesize(&auth_memory(2, 20), &interventions, &mut db, now());
        assert_eq!(run.lessons_created, 1);
        assert_eq!(db.lessons.len(), 2);
        assert!(db.lesson(&old_id).unwrap().dismissed);
    }

    #[test]
    fn stats_sorted_by_effectiveness_desc() {
        let mut interventions = InterventionMemory::default();
        interventions.record(intervention("revert", false));
        interventions.record(intervention("tracer_test", true));
        let stats = intervention_stats(&interventions, SpiralPattern::CredentialsAuth);
        assert_eq!(stats[0].kind, "tracer_test");
        assert_eq!(stats[0].effectiveness, 100.0);
        assert_eq!(stats[1].kind, "revert");
    }

    #[test]
    fn critical_severity_from_expensive_pattern() {
        let patterns = auth_memory(3, 50); // 150 minutes total
        let mut db = LessonsDatabase::default();
        synthesize(&patterns, &InterventionMemory::default(), &mut db, now());
        assert_eq!(db.lessons[0].severity, Severity::Critical);
    }
}
