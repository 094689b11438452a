//! Returns Data Loader Module
//! Handles spreadsheet loading, zero normalization and the per-process table cache.

use calamine::{open_workbook_auto, Data, Range, Reader};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use super::processor::is_numeric;
use super::{NA_MARKERS, RESERVED_COLUMNS, YEAR_COLUMN};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data source unavailable: {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("Unsupported data source extension: .{0}")]
    UnsupportedFormat(String),
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Failed to build table: {0}")]
    Polars(#[from] PolarsError),
    #[error("Data source has no `{0}` column")]
    MissingColumn(String),
    #[error("`Year` column must hold numbers, found {0}")]
    NonNumericYear(String),
    #[error("Data source column `{0}` clashes with a generated output column")]
    ReservedColumn(String),
    #[error("No data loaded")]
    NoData,
}

/// Loads the returns table once and serves it for the rest of the process.
///
/// The cache has a single population point, [`DataLoader::table`], and is
/// never invalidated. A failed load leaves it empty.
pub struct DataLoader {
    file_path: PathBuf,
    sheet: Option<String>,
    table: OnceLock<DataFrame>,
}

impl DataLoader {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            sheet: None,
            table: OnceLock::new(),
        }
    }

    /// Read a named worksheet instead of the first one.
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    /// Get the cached table, loading it on first use.
    pub fn table(&self) -> Result<&DataFrame, LoaderError> {
        if let Some(df) = self.table.get() {
            return Ok(df);
        }

        let df = Self::load(&self.file_path, self.sheet.as_deref())?;
        Ok(self.table.get_or_init(|| df))
    }

    /// Whether the table has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    /// Parse a data source and normalize it. Dispatches by extension.
    pub fn load(path: &Path, sheet: Option<&str>) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let raw = match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::read_workbook(path, sheet)?,
            "csv" => Self::read_csv(path)?,
            other => return Err(LoaderError::UnsupportedFormat(other.to_string())),
        };

        let df = Self::normalize(raw)?;
        log::info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<DataFrame, LoaderError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| LoaderError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let sheet_name = match sheet {
            Some(name) => name.to_string(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or(LoaderError::NoData)?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        Self::frame_from_range(&range)
    }

    fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let null_values = NA_MARKERS.iter().map(|m| (*m).into()).collect();
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_null_values(Some(NullValues::AllColumns(null_values)))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Build a table from a worksheet range. The first row holds the headers.
    ///
    /// A column whose non-empty cells all read as numbers becomes `Float64`;
    /// anything else is kept as text.
    pub fn frame_from_range(range: &Range<Data>) -> Result<DataFrame, LoaderError> {
        let mut rows = range.rows();
        let header = rows.next().ok_or(LoaderError::NoData)?;
        let body: Vec<&[Data]> = rows.collect();

        let mut columns = Vec::with_capacity(header.len());
        for (idx, cell) in header.iter().enumerate() {
            let name = match cell {
                Data::Empty => format!("column_{idx}"),
                other => other.to_string().trim().to_string(),
            };
            let cells = body.iter().map(|row| row.get(idx).unwrap_or(&EMPTY_CELL));

            let numeric: Option<Vec<Option<f64>>> = cells.clone().map(cell_to_number).collect();
            let column = match numeric {
                Some(values) => Column::new(name.into(), values),
                None => {
                    let text: Vec<Option<String>> = cells
                        .map(|c| match c {
                            Data::Empty => None,
                            other => Some(other.to_string()),
                        })
                        .collect();
                    Column::new(name.into(), text)
                }
            };
            columns.push(column);
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Replace zero with missing in every numeric column and type `Year` as an integer.
    ///
    /// Zero in these returns means "not reported". `Year` must be numeric and
    /// no column may use a reserved output name.
    pub fn normalize(df: DataFrame) -> Result<DataFrame, LoaderError> {
        let year = df
            .column(YEAR_COLUMN)
            .map_err(|_| LoaderError::MissingColumn(YEAR_COLUMN.to_string()))?;
        if !is_numeric(year.dtype()) {
            return Err(LoaderError::NonNumericYear(year.dtype().to_string()));
        }
        if let Some(name) = RESERVED_COLUMNS.iter().find(|name| df.column(name).is_ok()) {
            return Err(LoaderError::ReservedColumn(name.to_string()));
        }

        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            if !is_numeric(column.dtype()) {
                columns.push(column.clone());
                continue;
            }

            let values = column.cast(&DataType::Float64)?;
            let normalized: Vec<Option<f64>> = values
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| *x != 0.0))
                .collect();
            let normalized = Column::new(column.name().clone(), normalized);

            if column.name().as_str() == YEAR_COLUMN {
                columns.push(normalized.cast(&DataType::Int64)?);
            } else {
                columns.push(normalized);
            }
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Get list of column names from the loaded table.
    pub fn get_columns(&self) -> Vec<String> {
        self.table
            .get()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get list of numeric feature columns (everything numeric except `Year`).
    pub fn get_numeric_columns(&self) -> Vec<String> {
        let Some(df) = self.table.get() else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .filter(|col| is_numeric(col.dtype()) && col.name().as_str() != YEAR_COLUMN)
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Get the distinct reporting years, sorted.
    pub fn get_years(&self) -> Vec<i64> {
        self.table
            .get()
            .and_then(|df| df.column(YEAR_COLUMN).ok())
            .and_then(|col| col.cast(&DataType::Int64).ok())
            .map(|col| {
                col.i64()
                    .map(|ca| ca.into_iter().flatten().collect::<BTreeSet<i64>>())
                    .unwrap_or_default()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the loaded table.
    pub fn get_row_count(&self) -> usize {
        self.table.get().map(|df| df.height()).unwrap_or(0)
    }

    /// Get file path.
    pub fn get_file_path(&self) -> &Path {
        &self.file_path
    }
}

static EMPTY_CELL: Data = Data::Empty;

/// `Some(None)` for a blank or error cell, `Some(Some(v))` for a number,
/// `None` for text.
fn cell_to_number(cell: &Data) -> Option<Option<f64>> {
    match cell {
        Data::Empty | Data::Error(_) => Some(None),
        Data::Int(i) => Some(Some(*i as f64)),
        Data::Float(f) => Some(Some(*f)),
        Data::String(s) => {
            let s = s.trim();
            if NA_MARKERS.contains(&s) {
                Some(None)
            } else {
                s.parse::<f64>().ok().map(Some)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_range() -> Range<Data> {
        let mut range = Range::new((0, 0), (3, 3));
        let header = ["Firm", "Year", "NWP (£m)", "SCR coverage ratio"];
        for (c, name) in header.iter().enumerate() {
            range.set_value((0, c as u32), Data::String(name.to_string()));
        }
        range.set_value((1, 0), Data::String("Alpha Insurance".to_string()));
        range.set_value((1, 1), Data::Float(2018.0));
        range.set_value((1, 2), Data::Float(120.5));
        range.set_value((1, 3), Data::Float(0.0));
        range.set_value((2, 0), Data::String("Beta Re".to_string()));
        range.set_value((2, 1), Data::Int(2019));
        range.set_value((2, 2), Data::String("85".to_string()));
        range.set_value((2, 3), Data::Float(1.7));
        range.set_value((3, 0), Data::String("Gamma Mutual".to_string()));
        range.set_value((3, 1), Data::Float(2019.0));
        range.set_value((3, 2), Data::Empty);
        range.set_value((3, 3), Data::Float(2.1));
        range
    }

    #[test]
    fn test_frame_from_range_types_columns() {
        let df = DataLoader::frame_from_range(&sample_range()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.column("Firm").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("NWP (£m)").unwrap().dtype(), &DataType::Float64);

        let nwp = df.column("NWP (£m)").unwrap();
        let nwp: Vec<Option<f64>> = nwp.f64().unwrap().into_iter().collect();
        assert_eq!(nwp, vec![Some(120.5), Some(85.0), None]);
    }

    #[test]
    fn test_normalize_replaces_zero_and_types_year() {
        let df = DataLoader::frame_from_range(&sample_range()).unwrap();
        let df = DataLoader::normalize(df).unwrap();

        assert_eq!(df.column(YEAR_COLUMN).unwrap().dtype(), &DataType::Int64);

        let scr = df.column("SCR coverage ratio").unwrap();
        let scr: Vec<Option<f64>> = scr.f64().unwrap().into_iter().collect();
        assert_eq!(scr, vec![None, Some(1.7), Some(2.1)]);
    }

    #[test]
    fn test_normalize_requires_year() {
        let df = DataFrame::new(vec![Column::new("A".into(), vec![1.0, 2.0])]).unwrap();
        let result = DataLoader::normalize(df);
        assert!(matches!(result, Err(LoaderError::MissingColumn(c)) if c == "Year"));
    }

    #[test]
    fn test_na_marker_reads_as_missing() {
        let mut range = Range::new((0, 0), (4, 1));
        range.set_value((0, 0), Data::String("Year".to_string()));
        range.set_value((0, 1), Data::String("NWP (£m)".to_string()));
        let cells = [
            Data::Float(10.0),
            Data::Float(11.0),
            Data::Float(1000.0),
            Data::String("n/a".to_string()),
        ];
        for (r, cell) in cells.into_iter().enumerate() {
            range.set_value((r as u32 + 1, 0), Data::Int(2018));
            range.set_value((r as u32 + 1, 1), cell);
        }

        let df = DataLoader::normalize(DataLoader::frame_from_range(&range).unwrap()).unwrap();
        let nwp = df.column("NWP (£m)").unwrap();
        assert_eq!(nwp.dtype(), &DataType::Float64);
        let nwp: Vec<Option<f64>> = nwp.f64().unwrap().into_iter().collect();
        assert_eq!(nwp, vec![Some(10.0), Some(11.0), Some(1000.0), None]);
    }

    #[test]
    fn test_markers_parse() {
        for marker in ["N/A", "NA", "-", "NULL", " n/a "] {
            assert_eq!(cell_to_number(&Data::String(marker.to_string())), Some(None));
        }
        assert_eq!(cell_to_number(&Data::String("n.a.".to_string())), None);
        assert_eq!(cell_to_number(&Data::String("-3.5".to_string())), Some(Some(-3.5)));
    }

    #[test]
    fn test_text_year_rejected() {
        let df = DataFrame::new(vec![
            Column::new("Year".into(), vec!["FY2018", "FY2019"]),
            Column::new("A".into(), vec![1.0, 2.0]),
        ])
        .unwrap();
        let result = DataLoader::normalize(df);
        assert!(matches!(result, Err(LoaderError::NonNumericYear(_))));
    }

    #[test]
    fn test_reserved_column_rejected() {
        let df = DataFrame::new(vec![
            Column::new("Year".into(), vec![2018i64, 2019]),
            Column::new("anomaly_score".into(), vec![1.0, 2.0]),
        ])
        .unwrap();
        let result = DataLoader::normalize(df);
        assert!(matches!(result, Err(LoaderError::ReservedColumn(c)) if c == "anomaly_score"));
    }

    #[test]
    fn test_csv_na_markers() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Year,NWP (£m)").unwrap();
        writeln!(file, "2018,10.5").unwrap();
        writeln!(file, "2018,N/A").unwrap();
        writeln!(file, "2018,-").unwrap();
        writeln!(file, "2018,12.0").unwrap();
        file.flush().unwrap();

        let df = DataLoader::load(file.path(), None).unwrap();
        let nwp = df.column("NWP (£m)").unwrap();
        assert_eq!(nwp.dtype(), &DataType::Float64);
        assert_eq!(nwp.null_count(), 2);
    }

    #[test]
    fn test_blank_header_gets_placeholder_name() {
        let mut range = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("Year".to_string()));
        range.set_value((0, 1), Data::Empty);
        range.set_value((1, 0), Data::Int(2020));
        range.set_value((1, 1), Data::Float(3.0));

        let df = DataLoader::frame_from_range(&range).unwrap();
        assert!(df.column("column_1").is_ok());
    }

    #[test]
    fn test_missing_source_is_unavailable() {
        let result = DataLoader::load(Path::new("no/such/PRA.xlsx"), None);
        assert!(matches!(result, Err(LoaderError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let mut file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        writeln!(file, "not really parquet").unwrap();

        let result = DataLoader::load(file.path(), None);
        assert!(matches!(result, Err(LoaderError::UnsupportedFormat(ext)) if ext == "parquet"));
    }

    #[test]
    fn test_cache_loads_once() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Year,NWP (£m),Net combined ratio").unwrap();
        writeln!(file, "2018,10.0,0.9").unwrap();
        writeln!(file, "2019,0,1.1").unwrap();
        writeln!(file, "2018,12.5,0").unwrap();
        file.flush().unwrap();

        let loader = DataLoader::new(file.path());
        assert!(!loader.is_loaded());

        let first = loader.table().unwrap() as *const DataFrame;
        let second = loader.table().unwrap() as *const DataFrame;
        assert_eq!(first, second);
        assert!(loader.is_loaded());

        assert_eq!(loader.get_row_count(), 3);
        assert_eq!(loader.get_years(), vec![2018, 2019]);
        assert_eq!(
            loader.get_numeric_columns(),
            vec!["NWP (£m)".to_string(), "Net combined ratio".to_string()]
        );
    }

    #[test]
    fn test_failed_load_leaves_cache_empty() {
        let loader = DataLoader::new("missing.xlsx");
        assert!(loader.table().is_err());
        assert!(!loader.is_loaded());
        assert!(loader.get_columns().is_empty());
    }
}
