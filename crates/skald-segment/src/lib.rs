mod session;
mod spiral;

pub use session::{segment_commits, SegmentStats, Session, DEFAULT_GAP_MINUTES};
pub use spiral::{detect_chains, FixChain, SPIRAL_THRESHOLD};
