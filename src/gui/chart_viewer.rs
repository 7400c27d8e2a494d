//! Chart Viewer Widget
//! Central scrollable panel: collapsible chart sections and the per-province
//! daily table.

use covid_dashboard::charts::{format_count, ChartPlotter};
use covid_dashboard::data::DetailTable;
use covid_dashboard::stats::ChartResult;
use covid_dashboard::DashboardView;
use egui::{CollapsingHeader, Color32, RichText, ScrollArea};

/// Shows the latest dashboard view.
#[derive(Default)]
pub struct ChartViewer {
    pub view: Option<DashboardView>,
    active_tab: usize,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.view = None;
        self.active_tab = 0;
    }

    pub fn set_view(&mut self, view: DashboardView) {
        if self.active_tab >= view.details.len() {
            self.active_tab = 0;
        }
        self.view = Some(view);
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(view) = &self.view else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("🦠 COVID-19 Cases in Indonesia per Province");
                ui.add_space(8.0);

                if let Some(charts) = &view.charts {
                    section(ui, "📊 Latest Total Cases per Province", true, &charts.latest_totals, |ui, data| {
                        ChartPlotter::draw_bar_chart(ui, data)
                    });
                    section(ui, "🔵 Total Cases vs Total Deaths", false, &charts.cases_vs_deaths, |ui, data| {
                        ChartPlotter::draw_scatter_chart(ui, data)
                    });
                    section(ui, "🟣 Total Cases Share", false, &charts.total_cases_share, |ui, data| {
                        ChartPlotter::draw_pie_chart(ui, data)
                    });
                    section(ui, "🟢 Total Recovered Share", false, &charts.recovered_share, |ui, data| {
                        ChartPlotter::draw_pie_chart(ui, data)
                    });
                    section(ui, "🟩 National Total Cases per Day", false, &charts.daily_trend, |ui, data| {
                        ChartPlotter::draw_area_chart(ui, data)
                    });
                    section(ui, "🔥 Case Correlation Heatmap", false, &charts.correlation, |ui, data| {
                        ChartPlotter::draw_heatmap(ui, data)
                    });
                }

                CollapsingHeader::new("📋 Daily Case Table per Province")
                    .default_open(false)
                    .show(ui, |ui| {
                        if view.is_empty() {
                            ui.label(
                                RichText::new("⚠ Data not available.")
                                    .color(Color32::from_rgb(220, 53, 69)),
                            );
                            return;
                        }
                        Self::draw_detail_tabs(ui, &view.details, &mut self.active_tab);
                    });
            });
    }

    fn draw_detail_tabs(ui: &mut egui::Ui, tables: &[DetailTable], active: &mut usize) {
        ui.horizontal_wrapped(|ui| {
            for (i, table) in tables.iter().enumerate() {
                ui.selectable_value(active, i, table.region.as_str());
            }
        });
        ui.separator();

        let Some(table) = tables.get(*active) else {
            return;
        };
        ui.label(
            RichText::new(format!("Daily Case Data – {}", table.region))
                .size(15.0)
                .strong(),
        );
        ui.add_space(5.0);

        let cell = |v: Option<f64>| v.map(format_count).unwrap_or_else(|| "–".to_string());

        ScrollArea::vertical()
            .id_salt(format!("detail_{}", table.region))
            .max_height(360.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("detail_grid_{}", table.region)))
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["", "Date", "Province", "New Cases", "New Deaths", "New Recovered"] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        for row in &table.rows {
                            ui.label(RichText::new(row.index.to_string()).size(11.0).color(Color32::GRAY));
                            ui.label(row.date.format("%Y-%m-%d").to_string());
                            ui.label(row.region.as_str());
                            ui.label(cell(row.new_cases));
                            ui.label(cell(row.new_deaths));
                            ui.label(cell(row.new_recovered));
                            ui.end_row();
                        }
                    });
            });
    }
}

/// Collapsible chart section; an unavailable chart shows its notice instead.
fn section<T>(
    ui: &mut egui::Ui,
    title: &str,
    open: bool,
    result: &ChartResult<T>,
    draw: impl FnOnce(&mut egui::Ui, &T),
) {
    CollapsingHeader::new(title)
        .default_open(open)
        .show(ui, |ui| match result {
            Ok(data) => draw(ui, data),
            Err(reason) => ChartPlotter::draw_unavailable(ui, reason),
        });
    ui.add_space(6.0);
}
