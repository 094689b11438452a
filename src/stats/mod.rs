//! Stats module - score statistics

mod calculator;

pub use calculator::{ScoreSummary, StatsCalculator};
