//! Outlier Scatter Module
//! Flagged rows' values against row index, one series per selected column.

use plotters::prelude::*;
use polars::prelude::{DataType, PolarsError};
use std::path::Path;
use thiserror::Error;

use crate::data::ROW_INDEX_COLUMN;
use crate::detect::Detection;

/// Series colors as RGB, cycled. Shared with the desktop viewer.
pub const PALETTE: [(u8, u8, u8); 10] = [
    (231, 76, 60),  // Red
    (52, 152, 219), // Blue
    (46, 204, 113), // Green
    (155, 89, 182), // Purple
    (243, 156, 18), // Orange
    (26, 188, 156), // Teal
    (233, 30, 99),  // Pink
    (0, 188, 212),  // Cyan
    (121, 85, 72),  // Brown
    (96, 125, 139), // Blue Grey
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("No outliers to plot")]
    Empty,
}

/// Points of one selected column.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub column: String,
    /// `(row_index, value)` pairs.
    pub points: Vec<(f64, f64)>,
}

impl ScatterSeries {
    /// One series per selected column of a detection.
    pub fn from_detection(detection: &Detection) -> Result<Vec<ScatterSeries>, ChartError> {
        let df = &detection.outliers;
        let index = df.column(ROW_INDEX_COLUMN)?.cast(&DataType::Float64)?;
        let index = index.f64()?;

        let mut series = Vec::with_capacity(detection.columns.len());
        for column in &detection.columns {
            let values = df.column(column)?.cast(&DataType::Float64)?;
            let points = index
                .into_iter()
                .zip(values.f64()?.into_iter())
                .filter_map(|(x, y)| Some((x?, y?)))
                .collect();
            series.push(ScatterSeries {
                column: column.clone(),
                points,
            });
        }

        Ok(series)
    }
}

/// Renders the outlier scatter to SVG.
pub struct ScatterPlotter;

impl ScatterPlotter {
    pub const WIDTH: u32 = 1000;
    pub const HEIGHT: u32 = 600;

    /// Axis ranges covering every point with a 5% margin.
    pub fn bounds(series: &[ScatterSeries]) -> Option<((f64, f64), (f64, f64))> {
        let mut points = series.iter().flat_map(|s| s.points.iter().copied());
        let (x0, y0) = points.next()?;
        let (mut x_min, mut x_max, mut y_min, mut y_max) = (x0, x0, y0, y0);
        for (x, y) in points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }

        let pad = |lo: f64, hi: f64| {
            let margin = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
            (lo - margin, hi + margin)
        };
        Some((pad(x_min, x_max), pad(y_min, y_max)))
    }

    /// Write the "Outliers Plot" for a year as an SVG file.
    pub fn render_svg(series: &[ScatterSeries], year: i64, path: &Path) -> Result<(), ChartError> {
        let ((x_min, x_max), (y_min, y_max)) = Self::bounds(series).ok_or(ChartError::Empty)?;
        let render = |e: &dyn std::fmt::Display| ChartError::Render(e.to_string());

        let root = SVGBackend::new(path, (Self::WIDTH, Self::HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| render(&e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Outliers Plot ({year})"), ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| render(&e))?;

        chart
            .configure_mesh()
            .x_desc("Index")
            .y_desc("Value")
            .draw()
            .map_err(|e| render(&e))?;

        for (i, s) in series.iter().enumerate() {
            let (r, g, b) = PALETTE[i % PALETTE.len()];
            let color = RGBColor(r, g, b);
            chart
                .draw_series(
                    s.points
                        .iter()
                        .map(move |&(x, y)| Circle::new((x, y), 4, color.filled())),
                )
                .map_err(|e| render(&e))?
                .label(s.column.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| render(&e))?;

        root.present().map_err(|e| render(&e))?;
        log::info!("Wrote outlier plot to {}", path.display());
        Ok(())
    }
}
