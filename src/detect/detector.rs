//! Outlier Detector Module
//! Year filter -> column validation -> missing-value removal -> model fit -> flagged rows.

use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

use super::isolation_forest::IsolationForest;
use super::model::{ModelError, OutlierModel};
use crate::data::processor::{self, is_numeric, ProcessorError};
use crate::data::{ANOMALY_SCORE_COLUMN, RESERVED_COLUMNS, ROW_INDEX_COLUMN};
use crate::stats::{ScoreSummary, StatsCalculator};

/// Fewest complete rows a model is fitted on.
pub const MIN_ROWS: usize = 2;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Invalid column set: {0}")]
    InvalidColumnSet(String),
    #[error(
        "Not enough data for this selection: {rows} complete row(s) for {year}, need at least {required}"
    )]
    InsufficientData {
        year: i64,
        rows: usize,
        required: usize,
    },
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result of one detection run.
#[derive(Debug, Clone)]
pub struct Detection {
    pub year: i64,
    pub columns: Vec<String>,
    /// Rows left after the year filter and missing-value removal.
    pub cleaned_rows: usize,
    /// Flagged rows in their original order, with `row_index` first and
    /// `anomaly_score` last.
    pub outliers: DataFrame,
    /// Scores of the flagged rows, aligned with `outliers`.
    pub scores: Vec<f64>,
    pub threshold: f64,
    /// Score distribution over all cleaned rows.
    pub summary: ScoreSummary,
}

impl Detection {
    pub fn outlier_count(&self) -> usize {
        self.outliers.height()
    }

    pub fn is_empty(&self) -> bool {
        self.outliers.height() == 0
    }

    /// Positions of the flagged rows in the loaded table.
    pub fn row_indices(&self) -> Vec<i64> {
        self.outliers
            .column(ROW_INDEX_COLUMN)
            .ok()
            .and_then(|col| col.i64().ok())
            .map(|ca| ca.into_iter().flatten().collect())
            .unwrap_or_default()
    }
}

/// Flags anomalous rows of one reporting year over a column selection.
pub struct OutlierDetector<M = IsolationForest> {
    model: M,
}

impl Default for OutlierDetector<IsolationForest> {
    fn default() -> Self {
        Self::new(IsolationForest::default())
    }
}

impl<M: OutlierModel> OutlierDetector<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Check a selection: non-empty, unique, and only numeric columns of `table`.
    /// A table carrying a reserved output column name is rejected too.
    pub fn validate_columns(table: &DataFrame, columns: &[String]) -> Result<(), DetectError> {
        if let Some(name) = RESERVED_COLUMNS
            .iter()
            .find(|name| table.column(name).is_ok())
        {
            return Err(DetectError::InvalidColumnSet(format!(
                "table has a column named `{name}`, which is reserved for the output"
            )));
        }

        if columns.is_empty() {
            return Err(DetectError::InvalidColumnSet(
                "no columns selected".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for name in columns {
            if !seen.insert(name.as_str()) {
                return Err(DetectError::InvalidColumnSet(format!(
                    "`{name}` selected more than once"
                )));
            }

            let column = table.column(name).map_err(|_| {
                DetectError::InvalidColumnSet(format!("`{name}` is not a column of the table"))
            })?;

            if !is_numeric(column.dtype()) {
                return Err(DetectError::InvalidColumnSet(format!(
                    "`{name}` is not numeric ({})",
                    column.dtype()
                )));
            }
        }

        Ok(())
    }

    /// Flag the outlier rows of `year` over `columns`.
    pub fn detect(
        &self,
        table: &DataFrame,
        year: i64,
        columns: &[String],
    ) -> Result<Detection, DetectError> {
        Self::validate_columns(table, columns)?;

        let indexed = processor::with_row_index(table)?;
        let filtered = processor::filter_by_year(&indexed, year)?;
        let cleaned = processor::drop_missing(&filtered, columns)?;
        log::debug!(
            "Year {}: {} rows, {} complete over {:?}",
            year,
            filtered.height(),
            cleaned.height(),
            columns
        );

        if cleaned.height() < MIN_ROWS {
            return Err(DetectError::InsufficientData {
                year,
                rows: cleaned.height(),
                required: MIN_ROWS,
            });
        }

        let features = processor::feature_matrix(&cleaned, columns)?;
        let fitted = self.model.fit(features.view())?;
        let prediction = self.model.predict(&fitted, features.view())?;

        let flags: Vec<bool> = prediction.labels.iter().map(|l| l.is_outlier()).collect();
        let scores: Vec<f64> = prediction
            .scores
            .iter()
            .zip(&flags)
            .filter(|(_, flagged)| **flagged)
            .map(|(score, _)| *score)
            .collect();

        let mask = BooleanChunked::from_slice("outlier".into(), &flags);
        let mut outliers = cleaned.filter(&mask)?;
        outliers.with_column(Column::new(ANOMALY_SCORE_COLUMN.into(), scores.clone()))?;

        log::info!(
            "Year {}: {} of {} rows flagged as outliers",
            year,
            outliers.height(),
            cleaned.height()
        );

        Ok(Detection {
            year,
            columns: columns.to_vec(),
            cleaned_rows: cleaned.height(),
            outliers,
            scores,
            threshold: prediction.threshold,
            summary: StatsCalculator::summarize(&prediction.scores),
        })
    }
}
