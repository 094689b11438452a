//! PRA Outliers - outlier detection for annual PRA insurer returns
//!
//! Loads a returns spreadsheet once, filters it to a reporting year and
//! flags anomalous rows over a selection of financial columns with an
//! isolation forest.

pub mod charts;
pub mod config;
pub mod data;
pub mod detect;
pub mod report;
pub mod stats;

#[cfg(feature = "gui")]
pub mod gui;

pub use config::AppConfig;
pub use data::{DataLoader, LoaderError, ROW_INDEX_COLUMN, YEAR_COLUMN};
pub use detect::{Detection, DetectError, IsolationForest, OutlierDetector};
