//! Charts module - outlier scatter rendering

mod scatter;

pub use scatter::{ChartError, ScatterPlotter, ScatterSeries, PALETTE};
