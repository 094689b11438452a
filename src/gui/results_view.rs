//! Results View Widget
//! Central panel: headline, outlier scatter and the flagged rows table.

use egui::{Color32, RichText, ScrollArea};
use egui_plot::{Legend, Plot, PlotPoints, Points};
use polars::prelude::AnyValue;

use crate::charts::{ScatterSeries, PALETTE};
use crate::detect::Detection;
use crate::report;

const PLOT_HEIGHT: f32 = 360.0;

#[derive(Default)]
pub struct ResultsView {
    detection: Option<Detection>,
    series: Vec<ScatterSeries>,
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_detection(&mut self, detection: Detection) {
        self.series = ScatterSeries::from_detection(&detection).unwrap_or_else(|e| {
            log::warn!("Cannot build scatter series: {}", e);
            Vec::new()
        });
        self.detection = Some(detection);
    }

    pub fn clear(&mut self) {
        self.detection = None;
        self.series.clear();
    }

    pub fn detection(&self) -> Option<&Detection> {
        self.detection.as_ref()
    }

    pub fn series(&self) -> &[ScatterSeries] {
        &self.series
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        let Some(detection) = &self.detection else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ui.label(RichText::new(report::headline(detection)).size(16.0).strong());
        ui.label(
            RichText::new(report::score_line(&detection.summary))
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(8.0);

        if detection.is_empty() {
            ui.label("No outliers for this selection.");
            return;
        }

        ui.label(RichText::new(format!("Outliers Plot ({})", detection.year)).strong());
        Plot::new(format!("outliers_{}", detection.year))
            .height(PLOT_HEIGHT)
            .legend(Legend::default())
            .x_axis_label("Index")
            .y_axis_label("Value")
            .show(ui, |plot_ui| {
                for (i, s) in self.series.iter().enumerate() {
                    let (r, g, b) = PALETTE[i % PALETTE.len()];
                    let points: PlotPoints = s.points.iter().map(|&(x, y)| [x, y]).collect();
                    plot_ui.points(
                        Points::new(points)
                            .radius(4.0)
                            .color(Color32::from_rgb(r, g, b))
                            .name(&s.column),
                    );
                }
            });

        ui.add_space(10.0);
        Self::draw_table(ui, detection);
    }

    fn draw_table(ui: &mut egui::Ui, detection: &Detection) {
        let df = &detection.outliers;
        ScrollArea::both().id_salt("outliers_table").show(ui, |ui| {
            egui::Grid::new("outliers_grid")
                .striped(true)
                .show(ui, |ui| {
                    for name in df.get_column_names() {
                        ui.label(RichText::new(name.as_str()).strong());
                    }
                    ui.end_row();

                    for row in 0..df.height() {
                        for column in df.get_columns() {
                            let text = column.get(row).map(cell_text).unwrap_or_default();
                            ui.label(text);
                        }
                        ui.end_row();
                    }
                });
        });
    }
}

fn cell_text(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float64(v) => format!("{v:.4}"),
        other => other.to_string(),
    }
}
