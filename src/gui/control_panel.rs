//! Control Panel Widget
//! Left side panel with data source, region selection and date filters.

use chrono::NaiveDate;
use covid_dashboard::data::{clamp_to, parse_date, Dataset, FilterCriteria};
use egui::{Color32, RichText, ScrollArea};
use std::path::PathBuf;

const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// One editable date field with its last valid value.
struct DateField {
    text: String,
    value: NaiveDate,
    parse_error: bool,
}

impl DateField {
    fn new(value: NaiveDate) -> Self {
        Self {
            text: value.format("%Y-%m-%d").to_string(),
            value,
            parse_error: false,
        }
    }

    /// Returns true when the committed value changed.
    fn show(&mut self, ui: &mut egui::Ui, label: &str, bounds: Option<(NaiveDate, NaiveDate)>) -> bool {
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new(label));
            let response = ui.add(egui::TextEdit::singleline(&mut self.text).desired_width(110.0));
            if response.lost_focus() {
                match parse_date(&self.text) {
                    Some(date) => {
                        let date = clamp_to(date, bounds);
                        self.text = date.format("%Y-%m-%d").to_string();
                        self.parse_error = false;
                        if date != self.value {
                            self.value = date;
                            changed = true;
                        }
                    }
                    None => self.parse_error = true,
                }
            }
        });
        if self.parse_error {
            ui.label(RichText::new("Use YYYY-MM-DD").size(11.0).color(ERROR_COLOR));
        }
        changed
    }
}

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub regions: Vec<String>,
    /// Selected regions in pick order, plus the committed date range.
    selection: FilterCriteria,
    pub show_combined: bool,
    bounds: Option<(NaiveDate, NaiveDate)>,
    start: DateField,
    end: DateField,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            regions: Vec::new(),
            selection: FilterCriteria::new(Vec::new(), NaiveDate::MIN, NaiveDate::MIN),
            show_combined: true,
            bounds: None,
            start: DateField::new(NaiveDate::MIN),
            end: DateField::new(NaiveDate::MIN),
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new(show_combined: bool) -> Self {
        Self {
            show_combined,
            ..Self::default()
        }
    }

    /// Reset the controls for a freshly loaded dataset.
    pub fn update_dataset(&mut self, dataset: &Dataset, defaults: &FilterCriteria) {
        self.csv_path = Some(dataset.source().to_path_buf());
        self.regions = dataset.regions().to_vec();
        self.selection = defaults.clone();
        self.bounds = dataset.date_bounds();
        self.start = DateField::new(defaults.start);
        self.end = DateField::new(defaults.end);
    }

    /// Current selection; regions keep the order they were picked in.
    pub fn criteria(&self) -> FilterCriteria {
        self.selection.clone()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🦠 COVID-19 Dashboard")
                    .size(20.0)
                    .color(Color32::from_rgb(255, 75, 75)),
            );
            ui.label(RichText::new("Indonesia per Province").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file loaded".to_string());
                    ui.label(RichText::new(&path_text).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Open").clicked() {
                            action = ControlPanelAction::OpenCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Province Selection =====
        ui.label(RichText::new("🗺 Provinces").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                    for region in &self.regions {
                        let mut checked = self.selection.regions.contains(region);
                        if ui.checkbox(&mut checked, region.as_str()).changed() {
                            self.selection.set_region(region, checked);
                            action = ControlPanelAction::CriteriaChanged;
                        }
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                for region in &self.regions {
                    self.selection.set_region(region, true);
                }
                action = ControlPanelAction::CriteriaChanged;
            }
            if ui.small_button("Clear All").clicked() {
                self.selection.regions.clear();
                action = ControlPanelAction::CriteriaChanged;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Date Filter =====
        ui.label(RichText::new("📅 Date Filter").size(14.0).strong());
        ui.add_space(5.0);

        if self.start.show(ui, "From date:", self.bounds) {
            self.selection.start = self.start.value;
            action = ControlPanelAction::CriteriaChanged;
        }
        if self.end.show(ui, "To date:", self.bounds) {
            self.selection.end = self.end.value;
            action = ControlPanelAction::CriteriaChanged;
        }
        if let Some(warning) = self.selection.validate() {
            ui.label(RichText::new(format!("❌ {}", warning)).size(11.0).color(ERROR_COLOR));
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        if ui
            .checkbox(&mut self.show_combined, "📑 Show combined case charts")
            .changed()
        {
            action = ControlPanelAction::CriteriaChanged;
        }

        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            let export_button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                .min_size(egui::vec2(150.0, 30.0));
            if ui.add_enabled(self.show_combined, export_button).clicked() {
                action = ControlPanelAction::ExportPng;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            ERROR_COLOR
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    OpenCsv,
    CriteriaChanged,
    ExportPng,
}
