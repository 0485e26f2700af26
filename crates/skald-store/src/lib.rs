mod lock;
mod ndjson;
mod paths;
mod state;

pub use lock::{lock_file, LockGuard};
pub use ndjson::{append_line, read_lines, ReadStats};
pub use paths::{project_id, StorePaths};
pub use state::{load_state, load_versioned, save_state, try_load_state, write_atomic, StateError};
