//! Append-only NDJSON logs.
//!
//! Appends write exactly one line. A crash mid-append can leave a trailing
//! partial line; the reader skips malformed lines individually and reports
//! how many were skipped instead of failing.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Outcome of a tolerant NDJSON read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    pub total: usize,
    pub parsed: usize,
    pub skipped: usize,
}

/// Append one record as a single NDJSON line, creating parent directories
/// on demand.
pub fn append_line<T: Serialize>(path: &Path, record: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Read all parseable records. Missing file yields an empty vec; malformed
/// or partial lines are counted in `skipped` and otherwise ignored.
pub fn read_lines<T: DeserializeOwned>(path: &Path) -> anyhow::Result<(Vec<T>, ReadStats)> {
    if !path.exists() {
        return Ok((Vec::new(), ReadStats::default()));
    }
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut stats = ReadStats::default();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.total += 1;
        match serde_json::from_str(&line) {
            Ok(record) => {
                records.push(record);
                stats.parsed += 1;
            }
            Err(_) => {
                stats.skipped += 1;
            }
        }
    }
    if stats.skipped > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped = stats.skipped,
            total = stats.total,
            "skipped malformed ndjson lines"
        );
    }
    Ok((records, stats))
}
