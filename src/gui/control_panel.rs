//! Control Panel Widget
//! Left side panel: year, feature columns, export and status.

use egui::{Color32, ComboBox, RichText, ScrollArea};

/// Left side control panel.
pub struct ControlPanel {
    pub source: String,
    pub years: Vec<i64>,
    pub year: i64,
    pub columns: Vec<String>,
    pub selected: Vec<bool>,
    pub status: String,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(source: String, years: Vec<i64>) -> Self {
        let year = years.first().copied().unwrap_or_default();
        Self {
            source,
            years,
            year,
            columns: Vec::new(),
            selected: Vec::new(),
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }

    /// Offer `columns`, pre-checking those in `defaults`.
    pub fn update_columns(&mut self, columns: Vec<String>, defaults: &[String]) {
        self.selected = columns.iter().map(|c| defaults.contains(c)).collect();
        self.columns = columns;
    }

    /// Checked columns in table order.
    pub fn selected_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.selected)
            .filter(|(_, selected)| **selected)
            .map(|(col, _)| col.clone())
            .collect()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("Outlier Detection")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(RichText::new(&self.source).size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Year =====
        ui.horizontal(|ui| {
            ui.add_sized([110.0, 20.0], egui::Label::new("Select a Year:"));
            ComboBox::from_id_salt("year")
                .width(120.0)
                .selected_text(self.year.to_string())
                .show_ui(ui, |ui| {
                    for &year in &self.years {
                        if ui
                            .selectable_label(self.year == year, year.to_string())
                            .clicked()
                            && self.year != year
                        {
                            self.year = year;
                            action = ControlPanelAction::SelectionChanged;
                        }
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Feature columns =====
        ui.label(RichText::new("Columns to check").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                    for (col, selected) in self.columns.iter().zip(self.selected.iter_mut()) {
                        if ui.checkbox(selected, col).changed() {
                            action = ControlPanelAction::SelectionChanged;
                        }
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.selected.iter_mut().for_each(|v| *v = true);
                action = ControlPanelAction::SelectionChanged;
            }
            if ui.small_button("Clear All").clicked() {
                self.selected.iter_mut().for_each(|v| *v = false);
                action = ControlPanelAction::SelectionChanged;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("Export plot (SVG)").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportSvg;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Not enough data") {
            Color32::from_rgb(243, 156, 18)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    SelectionChanged,
    ExportSvg,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_prechecked() {
        let mut panel = ControlPanel::new("PRA.xlsx".to_string(), vec![2016, 2017]);
        panel.update_columns(names(&["A", "B", "C"]), &names(&["C", "A", "Z"]));

        assert_eq!(panel.year, 2016);
        assert_eq!(panel.selected, vec![true, false, true]);
        assert_eq!(panel.selected_columns(), names(&["A", "C"]));
    }

    #[test]
    fn test_no_years() {
        let panel = ControlPanel::new(String::new(), Vec::new());
        assert_eq!(panel.year, 0);
        assert!(panel.selected_columns().is_empty());
    }
}
