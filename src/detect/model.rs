//! Anomaly model contract.
//!
//! The detector only talks to models through [`OutlierModel`], so the
//! isolation forest can be swapped for another algorithm without touching
//! filtering or validation.

use ndarray::ArrayView2;
use thiserror::Error;

/// Anomaly model errors.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("empty feature matrix")]
    EmptyMatrix,

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Feature count mismatch: fitted on {fitted}, got {got}")]
    DimensionMismatch { fitted: usize, got: usize },
}

/// Per-row classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Inlier,
    Outlier,
}

impl Label {
    pub fn is_outlier(self) -> bool {
        self == Label::Outlier
    }
}

/// Scores and labels for every row of a feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Anomaly score per row; higher is more anomalous.
    pub scores: Vec<f64>,
    pub labels: Vec<Label>,
    /// Rows scoring strictly above this are outliers.
    pub threshold: f64,
}

impl Prediction {
    pub fn outlier_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_outlier()).count()
    }
}

/// Unsupervised anomaly model.
pub trait OutlierModel {
    /// State learned by [`OutlierModel::fit`].
    type Fitted;

    /// Fit the model to a feature matrix (rows = samples, cols = features).
    fn fit(&self, features: ArrayView2<'_, f64>) -> Result<Self::Fitted, ModelError>;

    /// Score and label every row of `features`.
    fn predict(
        &self,
        fitted: &Self::Fitted,
        features: ArrayView2<'_, f64>,
    ) -> Result<Prediction, ModelError>;
}
