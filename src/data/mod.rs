//! Data module - spreadsheet loading and row preparation

mod loader;
pub mod processor;

pub use loader::{DataLoader, LoaderError};
pub use processor::ProcessorError;

/// Reporting year column every source must carry.
pub const YEAR_COLUMN: &str = "Year";

/// Position of a row in the loaded table, attached before filtering.
pub const ROW_INDEX_COLUMN: &str = "row_index";

/// Score column appended to the flagged rows.
pub const ANOMALY_SCORE_COLUMN: &str = "anomaly_score";

/// Names the pipeline adds to its output; a source may not carry them.
pub const RESERVED_COLUMNS: [&str; 2] = [ROW_INDEX_COLUMN, ANOMALY_SCORE_COLUMN];

/// Cell texts read as missing. Same set `pandas.read_excel` treats as NaN,
/// plus a lone dash.
pub const NA_MARKERS: [&str; 20] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "-", "",
];
