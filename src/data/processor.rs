//! Data Processor Module
//! Year filtering, missing-value removal and feature matrix extraction.

use ndarray::Array2;
use polars::prelude::*;
use thiserror::Error;

use super::{ROW_INDEX_COLUMN, YEAR_COLUMN};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing value in `{column}` at row {row}")]
    MissingValue { column: String, row: usize },
    #[error("Column `{0}` already exists")]
    DuplicateColumn(String),
}

/// Whether a column holds numbers.
pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Prepend a `row_index` column holding each row's position in `df`.
pub fn with_row_index(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
    if df.column(ROW_INDEX_COLUMN).is_ok() {
        return Err(ProcessorError::DuplicateColumn(ROW_INDEX_COLUMN.to_string()));
    }

    let index: Vec<i64> = (0..df.height() as i64).collect();
    let mut columns = Vec::with_capacity(df.width() + 1);
    columns.push(Column::new(ROW_INDEX_COLUMN.into(), index));
    columns.extend(df.get_columns().iter().cloned());
    Ok(DataFrame::new(columns)?)
}

/// Keep the rows whose `Year` equals `year`. An empty result is not an error.
pub fn filter_by_year(df: &DataFrame, year: i64) -> Result<DataFrame, ProcessorError> {
    let filtered = df
        .clone()
        .lazy()
        .filter(col(YEAR_COLUMN).eq(lit(year)))
        .collect()?;
    Ok(filtered)
}

/// Drop every row with a null or non-finite value in any of `columns`.
/// Row order is preserved.
pub fn drop_missing(df: &DataFrame, columns: &[String]) -> Result<DataFrame, ProcessorError> {
    let mut keep = vec![true; df.height()];

    for name in columns {
        let values = df.column(name)?.cast(&DataType::Float64)?;
        let values = values.f64()?;
        for (keep, v) in keep.iter_mut().zip(values.into_iter()) {
            *keep &= v.is_some_and(f64::is_finite);
        }
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

/// Build the feature matrix: one row per table row, one column per feature.
pub fn feature_matrix(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>, ProcessorError> {
    let mut matrix = Array2::<f64>::zeros((df.height(), columns.len()));

    for (j, name) in columns.iter().enumerate() {
        let values = df.column(name)?.cast(&DataType::Float64)?;
        let values = values.f64()?;
        for (i, v) in values.into_iter().enumerate() {
            matrix[[i, j]] = v.ok_or_else(|| ProcessorError::MissingValue {
                column: name.clone(),
                row: i,
            })?;
        }
    }

    Ok(matrix)
}
