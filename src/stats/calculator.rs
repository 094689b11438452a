//! Statistics Calculator Module
//! Descriptive statistics over anomaly scores.

use serde::Serialize;

/// Summary of the anomaly score distribution of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub p05: f64,
    pub p95: f64,
    pub max: f64,
}

impl Default for ScoreSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            p05: f64::NAN,
            p95: f64::NAN,
            max: f64::NAN,
        }
    }
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn summarize(values: &[f64]) -> ScoreSummary {
        let n = values.len();
        if n == 0 {
            return ScoreSummary::default();
        }

        let sorted = Self::sorted(values);

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        ScoreSummary {
            count: n,
            mean,
            median,
            std: variance.sqrt(),
            p05: Self::percentile(&sorted, 5.0),
            p95: Self::percentile(&sorted, 95.0),
            max: sorted[n - 1],
        }
    }

    /// Copy of `values` in ascending order.
    pub fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_empty() {
        let summary = StatsCalculator::summarize(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.mean.is_nan());
    }

    #[test]
    fn test_summarize_values() {
        let summary = StatsCalculator::summarize(&[0.4, 0.2, 0.8, 0.6]);
        assert_eq!(summary.count, 4);
        assert!((summary.mean - 0.5).abs() < 1e-12);
        assert!((summary.median - 0.5).abs() < 1e-12);
        assert_eq!(summary.max, 0.8);
        assert!(summary.p05 < summary.median && summary.median < summary.p95);
    }

    #[test]
    fn test_percentile_matches_numpy() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(StatsCalculator::percentile(&sorted, 50.0), 3.0);
        assert!((StatsCalculator::percentile(&sorted, 90.0) - 4.6).abs() < 1e-12);
        assert_eq!(StatsCalculator::percentile(&sorted, 100.0), 5.0);
        assert_eq!(StatsCalculator::percentile(&[7.0], 30.0), 7.0);
    }
}
