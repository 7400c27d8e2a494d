//! COVID-19 Dashboard Main Application
//! Main window with control panel and chart viewer.

use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use covid_dashboard::charts::StaticChartRenderer;
use covid_dashboard::data::{DataLoader, Dataset, FilterCriteria};
use covid_dashboard::{DashboardConfig, Pipeline};
use egui::{Color32, RichText, SidePanel};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete(Arc<Dataset>),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    dataset: Option<Arc<Dataset>>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    /// Set when the startup dataset cannot be loaded; the session stops here.
    fatal: Option<String>,
    /// Selection changed since the last recompute.
    dirty: bool,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(config.show_combined),
            chart_viewer: ChartViewer::new(),
            dataset: None,
            fatal: None,
            dirty: false,
            load_rx: None,
            is_loading: false,
            config,
        };
        let path = app.config.data_path.clone();
        app.start_loading(path);
        app
    }

    /// Load a CSV on a background thread. Cached datasets come back at once.
    fn start_loading(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }
        self.is_loading = true;
        self.control_panel.set_status("Loading CSV file...");

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let result = match DataLoader::load_cached(&path) {
                Ok(ds) => LoadResult::Complete(ds),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(ds)) => {
                info!(path = %ds.source().display(), "dataset ready");
                let defaults = FilterCriteria::defaults_for(&ds, self.config.default_region_count);
                self.control_panel.update_dataset(&ds, &defaults);
                self.control_panel.set_status(&format!(
                    "Loaded {} rows, {} provinces",
                    ds.len(),
                    ds.regions().len()
                ));
                self.chart_viewer.clear();
                self.dataset = Some(ds);
                self.fatal = None;
                self.dirty = true;
                self.is_loading = false;
            }
            Ok(LoadResult::Error(message)) => {
                error!(%message, "dataset load failed");
                // Only the startup dataset is fatal; a failed switch keeps the current one.
                if self.dataset.is_none() {
                    self.fatal = Some(message.clone());
                }
                self.control_panel.set_status(&format!("Error: {}", message));
                self.is_loading = false;
            }
            Err(TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                error!("loader thread exited without a result");
                self.control_panel.set_status("Error: loading was interrupted");
                self.is_loading = false;
            }
        }
    }

    fn handle_open_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_loading(path);
        }
    }

    fn recompute(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let criteria = self.control_panel.criteria();
        match Pipeline::recompute(ds, &criteria, self.control_panel.show_combined) {
            Ok(view) => self.chart_viewer.set_view(view),
            Err(e) => {
                error!(error = %e, "recompute failed");
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
        self.dirty = false;
    }

    fn handle_export_png(&mut self) {
        let Some(view) = &self.chart_viewer.view else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        match StaticChartRenderer::export_all(
            view,
            &self.config.export_dir,
            self.config.export_width,
            self.config.export_height,
        ) {
            Ok(files) if files.is_empty() => {
                self.control_panel.set_status("No charts available to export");
            }
            Ok(files) => {
                self.control_panel
                    .set_status(&format!("Exported {} charts", files.len()));
                if let Err(e) = open::that(&self.config.export_dir) {
                    warn!(error = %e, "could not open export directory");
                }
            }
            Err(e) => {
                error!(error = %e, "chart export failed");
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    fn show_fatal(ui: &mut egui::Ui, message: &str) {
        ui.centered_and_justified(|ui| {
            ui.label(
                RichText::new(format!("❌ {}", message))
                    .size(18.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        if let Some(message) = &self.fatal {
            egui::CentralPanel::default().show(ctx, |ui| Self::show_fatal(ui, message));
            return;
        }

        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::OpenCsv => self.handle_open_csv(),
                        ControlPanelAction::CriteriaChanged => self.dirty = true,
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Full recompute on every selection change.
        if self.dirty {
            self.recompute();
        }

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            let source = self
                .dataset
                .as_ref()
                .and_then(|ds| ds.source().file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            ui.label(RichText::new(format!("📌 Data source: {}", source)).italics());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.is_loading && self.dataset.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
            self.chart_viewer.show(ui);
        });
    }
}
