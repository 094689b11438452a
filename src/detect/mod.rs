//! Outlier detection: model contract, isolation forest and the detector pipeline

mod detector;
mod isolation_forest;
mod model;

pub use crate::data::ANOMALY_SCORE_COLUMN;
pub use detector::{Detection, DetectError, OutlierDetector, MIN_ROWS};
pub use isolation_forest::{Contamination, FittedForest, IsolationForest, AUTO_THRESHOLD};
pub use model::{Label, ModelError, OutlierModel, Prediction};
