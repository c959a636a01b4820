//! Stats module - descriptive statistics and outlier bounds

mod calculator;

pub use calculator::{ColumnSummary, IqrBounds, LinearTrend, StatsCalculator};
