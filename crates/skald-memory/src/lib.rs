mod intervention;
mod pattern;
mod profile;

pub use intervention::{kind, InterventionAggregates, InterventionMemory, InterventionRecord};
pub use pattern::{PatternAggregates, PatternMemory, SpiralRecord, MEMORY_CAP};
pub use profile::{Profile, PROFILE_VERSION};

/// Format a date as `YYYY-MM-DD` for memory records.
pub(crate) fn date_string(ts: time::OffsetDateTime) -> String {
    let d = ts.date();
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}
