//! GUI module - desktop viewer for detection results

mod app;
mod control_panel;
mod results_view;

pub use app::OutlierApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use results_view::ResultsView;

use crate::config::AppConfig;

/// Open the viewer window and block until it is closed.
pub fn run(config: AppConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("PRA Outliers"),
        ..Default::default()
    };

    eframe::run_native(
        "PRA Outliers",
        options,
        Box::new(|cc| Ok(Box::new(OutlierApp::new(cc, config)))),
    )
}
