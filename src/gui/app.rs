//! PRA Outliers Main Application
//! Main window with control panel and results view.
//!
//! Detection reruns whenever the year or column selection changes. The
//! returns table is loaded once when the window opens.

use egui::SidePanel;

use crate::charts::ScatterPlotter;
use crate::config::AppConfig;
use crate::data::DataLoader;
use crate::detect::{DetectError, OutlierDetector};
use crate::gui::{ControlPanel, ControlPanelAction, ResultsView};

/// Main application window.
pub struct OutlierApp {
    loader: DataLoader,
    detector: OutlierDetector,
    control_panel: ControlPanel,
    results: ResultsView,
    loaded: bool,
}

impl OutlierApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let loader = DataLoader::new(&config.data_path).with_sheet(config.sheet.clone());
        let source = config.data_path.display().to_string();

        let mut app = Self {
            detector: OutlierDetector::new(config.forest.build()),
            control_panel: ControlPanel::new(source, config.years.clone()),
            results: ResultsView::new(),
            loaded: false,
            loader,
        };

        match app.loader.table() {
            Ok(table) => {
                log::info!("Loaded {} rows", table.height());
                app.loaded = true;
                app.control_panel
                    .update_columns(app.loader.get_numeric_columns(), &config.default_columns);
                app.run_detection();
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", config.data_path.display(), e);
                app.control_panel.set_status(format!("Error: {}", e));
            }
        }

        app
    }

    fn run_detection(&mut self) {
        if !self.loaded {
            return;
        }
        let table = match self.loader.table() {
            Ok(table) => table,
            Err(e) => {
                self.control_panel.set_status(format!("Error: {}", e));
                return;
            }
        };

        let year = self.control_panel.year;
        let columns = self.control_panel.selected_columns();

        match self.detector.detect(table, year, &columns) {
            Ok(detection) => {
                self.control_panel.set_status(format!(
                    "{} outlier(s) in {} rows",
                    detection.outlier_count(),
                    detection.cleaned_rows
                ));
                self.control_panel.export_enabled = !detection.is_empty();
                self.results.set_detection(detection);
            }
            Err(e) => {
                let status = match &e {
                    DetectError::InsufficientData { .. } => e.to_string(),
                    _ => format!("Error: {}", e),
                };
                self.control_panel.set_status(status);
                self.control_panel.export_enabled = false;
                self.results.clear();
            }
        }
    }

    fn handle_export_svg(&mut self) {
        let Some(detection) = self.results.detection() else {
            return;
        };
        let year = detection.year;

        let Some(path) = rfd::FileDialog::new()
            .add_filter("SVG", &["svg"])
            .set_file_name(format!("outliers_{}.svg", year))
            .save_file()
        else {
            return;
        };

        match ScatterPlotter::render_svg(self.results.series(), year, &path) {
            Ok(()) => self
                .control_panel
                .set_status(format!("Plot saved to {}", path.display())),
            Err(e) => self.control_panel.set_status(format!("Error: {}", e)),
        }
    }
}

impl eframe::App for OutlierApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::SelectionChanged => self.run_detection(),
                        ControlPanelAction::ExportSvg => self.handle_export_svg(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.results.show(ui);
        });
    }
}
