//! Isolation Forest anomaly model.
//!
//! Points that a random partitioning separates in few splits are anomalous.
//! Defaults mirror the usual reference settings: 100 trees, 256 rows per
//! tree, depth limit `ceil(log2(sample_size))`, and an `auto` contamination
//! that flags scores above 0.5.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::consts::EULER_MASCHERONI;

use super::model::{Label, ModelError, OutlierModel, Prediction};
use crate::stats::StatsCalculator;

/// Decision threshold on the score scale for [`Contamination::Auto`].
pub const AUTO_THRESHOLD: f64 = 0.5;

/// Scores within rounding distance of the threshold count as inliers.
const SCORE_TOLERANCE: f64 = 1e-9;

/// How the outlier threshold is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contamination {
    /// Threshold fixed on the score scale; the flagged share follows the data.
    Auto,
    /// Flag this share of the training rows, in `(0, 0.5]`.
    Fraction(f64),
}

/// Isolation Forest configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForest {
    n_trees: usize,
    max_samples: usize,
    seed: u64,
    contamination: Contamination,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SEED)
    }
}

impl IsolationForest {
    pub fn new(seed: u64) -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            seed,
            contamination: Contamination::Auto,
        }
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_contamination(mut self, contamination: Contamination) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn validate(&self, features: &ArrayView2<'_, f64>) -> Result<(), ModelError> {
        if features.nrows() == 0 || features.ncols() == 0 {
            return Err(ModelError::EmptyMatrix);
        }
        if features.nrows() < 2 {
            return Err(ModelError::InvalidParameter {
                name: "n_samples".to_string(),
                reason: format!("need at least 2 rows to fit, got {}", features.nrows()),
            });
        }
        if self.n_trees == 0 {
            return Err(ModelError::InvalidParameter {
                name: "n_trees".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if self.max_samples < 2 {
            return Err(ModelError::InvalidParameter {
                name: "max_samples".to_string(),
                reason: "must be >= 2".to_string(),
            });
        }
        if let Contamination::Fraction(f) = self.contamination {
            if !(f > 0.0 && f <= 0.5) {
                return Err(ModelError::InvalidParameter {
                    name: "contamination".to_string(),
                    reason: format!("fraction must be in (0, 0.5], got {f}"),
                });
            }
        }
        Ok(())
    }
}

/// A trained forest.
#[derive(Debug, Clone)]
pub struct FittedForest {
    trees: Vec<Node>,
    sample_size: usize,
    n_features: usize,
    threshold: f64,
}

impl FittedForest {
    /// Anomaly score in `(0, 1]` for every row.
    pub fn score_samples(&self, features: ArrayView2<'_, f64>) -> Vec<f64> {
        let normalizer = average_path_length(self.sample_size);
        features
            .rows()
            .into_iter()
            .map(|point| {
                let total: f64 = self.trees.iter().map(|tree| tree.path_length(point)).sum();
                let mean = total / self.trees.len() as f64;
                2f64.powf(-mean / normalizer)
            })
            .collect()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl OutlierModel for IsolationForest {
    type Fitted = FittedForest;

    fn fit(&self, features: ArrayView2<'_, f64>) -> Result<FittedForest, ModelError> {
        self.validate(&features)?;

        let n_rows = features.nrows();
        let sample_size = self.max_samples.min(n_rows);
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        log::debug!(
            "Fitting isolation forest: {} trees, sample_size={}, max_depth={}, seed={}",
            self.n_trees,
            sample_size,
            max_depth,
            self.seed
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let trees = (0..self.n_trees)
            .map(|_| {
                let rows = index::sample(&mut rng, n_rows, sample_size).into_vec();
                Node::grow(&features, rows, 0, max_depth, &mut rng)
            })
            .collect();

        let mut fitted = FittedForest {
            trees,
            sample_size,
            n_features: features.ncols(),
            threshold: AUTO_THRESHOLD,
        };

        if let Contamination::Fraction(f) = self.contamination {
            let sorted = StatsCalculator::sorted(&fitted.score_samples(features));
            fitted.threshold = StatsCalculator::percentile(&sorted, 100.0 * (1.0 - f));
        }

        Ok(fitted)
    }

    fn predict(
        &self,
        fitted: &FittedForest,
        features: ArrayView2<'_, f64>,
    ) -> Result<Prediction, ModelError> {
        if features.ncols() != fitted.n_features {
            return Err(ModelError::DimensionMismatch {
                fitted: fitted.n_features,
                got: features.ncols(),
            });
        }

        let scores = fitted.score_samples(features);
        let labels = scores
            .iter()
            .map(|&s| {
                if s - fitted.threshold > SCORE_TOLERANCE {
                    Label::Outlier
                } else {
                    Label::Inlier
                }
            })
            .collect();

        Ok(Prediction {
            scores,
            labels,
            threshold: fitted.threshold,
        })
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn grow(
        features: &ArrayView2<'_, f64>,
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        if rows.len() <= 1 || depth >= max_depth {
            return Node::Leaf { size: rows.len() };
        }

        // Only features that still vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..features.ncols())
            .filter_map(|feature| {
                let (lo, hi) = rows.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &row| {
                        let v = features[[row, feature]];
                        (lo.min(v), hi.max(v))
                    },
                );
                (hi > lo).then_some((feature, lo, hi))
            })
            .collect();

        let Some(&(feature, lo, hi)) = candidates.choose(rng) else {
            return Node::Leaf { size: rows.len() };
        };

        let value = split_value(lo, hi, rng.gen::<f64>());
        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| features[[row, feature]] <= value);

        Node::Split {
            feature,
            value,
            left: Box::new(Node::grow(features, left, depth + 1, max_depth, rng)),
            right: Box::new(Node::grow(features, right, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, point: ArrayView1<'_, f64>) -> f64 {
        let mut node = self;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    node = if point[*feature] <= *value { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Point `t` of the way from `lo` to `hi`, in `[lo, hi)` so both sides of the
/// split are non-empty. Halving first keeps `hi - lo` finite for extreme bounds.
fn split_value(lo: f64, hi: f64, t: f64) -> f64 {
    let half = hi / 2.0 - lo / 2.0;
    let value = lo + t * half + t * half;
    if value >= lo && value < hi {
        value
    } else {
        lo
    }
}

/// Average path length of an unsuccessful search in a binary search tree of `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
        }
    }
}
