use serde::{Deserialize, Serialize};
use skald_core::pattern::classify_messages;
use skald_core::{Commit, SpiralPattern};
use time::OffsetDateTime;

/// A chain of this many consecutive fix commits is a debug spiral.
pub const SPIRAL_THRESHOLD: usize = 3;

/// A run of consecutive fix commits attributed to one component within a
/// session. Chain membership is contiguous in time; a chain ends when a
/// non-fix commit or a different component's fix interrupts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixChain {
    pub component: String,
    pub commit_count: usize,
    /// First-to-last timestamp delta in whole minutes, rounded.
    pub duration_minutes: i64,
    pub pattern: SpiralPattern,
    pub is_spiral: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub first_ts: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_ts: OffsetDateTime,
}

/// Scan a session's commits (time order) and collect fix chains. A fix
/// commit with no attributable component ends the current chain without
/// starting one.
pub fn detect_chains(commits: &[Commit]) -> Vec<FixChain> {
    let mut chains = Vec::new();
    let mut run: Vec<&Commit> = Vec::new();
    let mut run_component: Option<String> = None;

    for commit in commits {
        if !commit.is_fix() {
            flush(&mut chains, &mut run, &mut run_component);
            continue;
        }
        match commit.component() {
            None => flush(&mut chains, &mut run, &mut run_component),
            Some(component) => {
                if run_component.as_deref() != Some(component.as_str()) {
                    flush(&mut chains, &mut run, &mut run_component);
                    run_component = Some(component);
                }
                run.push(commit);
            }
        }
    }
    flush(&mut chains, &mut run, &mut run_component);
    chains
}

fn flush(chains: &mut Vec<FixChain>, run: &mut Vec<&Commit>, component: &mut Option<String>) {
    let commits = std::mem::take(run);
    let comp = component.take();
    let (Some(first), Some(last), Some(comp)) = (commits.first(), commits.last(), comp) else {
        return;
    };
    let seconds = (last.ts - first.ts).whole_seconds();
    let duration_minutes = (seconds as f64 / 60.0).round() as i64;
    let joined = commits
        .iter()
        .map(|c| c.message.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    chains.push(FixChain {
        component: comp,
        commit_count: commits.len(),
        duration_minutes,
        pattern: classify_messages(&joined),
        is_spiral: commits.len() >= SPIRAL_THRESHOLD,
        first_ts: first.ts,
        last_ts: last.ts,
    });
}
