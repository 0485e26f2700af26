mod bucket;
mod regression;

pub use bucket::{monthly_trends, weekly_trends, TrendBucket, MONTHLY_KEEP, WEEKLY_KEEP};
pub use regression::{
    detect_regressions, improvement_streak, RegressionAlert, RegressionKind, RegressionSeverity,
};
