mod commit_log;
mod history;
mod record;

pub use commit_log::CommitLog;
pub use history::{
    is_duplicate_period, History, HistoryStore, RecordOutcome, DUPLICATE_SCAN, HISTORY_CAP,
    HISTORY_VERSION, OVERLAP_LIMIT,
};
pub use record::{AnalyzedPeriod, SessionRecord};
