mod analyze;
mod metrics;
mod rating;
mod score;

pub use analyze::{analyze_commits, AnalyzeOptions, SessionReport, SessionSummary};
pub use metrics::{
    code_health, compute_session_metrics, flow_efficiency, iteration_velocity, rework_ratio,
    spiral_duration, trust_pass_rate, SessionMetrics,
};
pub use rating::{MetricValue, Rating};
pub use score::{pattern_score, PatternScore, VelocityBaseline};
