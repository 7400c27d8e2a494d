//! Chart Plotter Module
//! Interactive chart widgets built on egui_plot and the egui painter.

use crate::stats::{CasesVsDeaths, CorrelationMatrix, DailySeries, RegionValues, Unavailable};
use chrono::{Datelike, NaiveDate};
use egui::{Align2, Color32, FontId, RichText, Sense, Shape, Stroke};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoint, PlotPoints, Points, Text};
use std::f32::consts::TAU;

pub const BAR_COLOR: Color32 = Color32::from_rgb(255, 165, 0); // Orange
pub const SCATTER_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const AREA_COLOR: Color32 = Color32::from_rgb(46, 139, 87); // Sea green
pub const WARNING_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(255, 87, 34),  // Deep Orange
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

/// Yellow → green → blue ramp for the heatmap.
const HEAT_STOPS: [(f64, [u8; 3]); 5] = [
    (-1.0, [255, 255, 217]),
    (-0.5, [199, 233, 180]),
    (0.0, [65, 182, 196]),
    (0.5, [34, 94, 168]),
    (1.0, [8, 29, 88]),
];

const CHART_HEIGHT: f32 = 280.0;

/// Day number since 0001-01-01, used as the plot x coordinate for dates.
pub fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Thousands-separated integer label.
pub fn format_count(value: f64) -> String {
    let n = value.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

/// Heatmap cell colour for a coefficient in [-1, 1]; NaN renders grey.
pub fn heat_color(r: f64) -> Color32 {
    if r.is_nan() {
        return Color32::GRAY;
    }
    let r = r.clamp(-1.0, 1.0);
    for pair in HEAT_STOPS.windows(2) {
        let (lo, lo_rgb) = pair[0];
        let (hi, hi_rgb) = pair[1];
        if r <= hi {
            let t = (r - lo) / (hi - lo);
            let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
            return Color32::from_rgb(
                mix(lo_rgb[0], hi_rgb[0]),
                mix(lo_rgb[1], hi_rgb[1]),
                mix(lo_rgb[2], hi_rgb[2]),
            );
        }
    }
    let [r, g, b] = HEAT_STOPS[HEAT_STOPS.len() - 1].1;
    Color32::from_rgb(r, g, b)
}

/// Draws the dashboard charts.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn get_region_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Inline notice shown in place of a chart.
    pub fn draw_unavailable(ui: &mut egui::Ui, reason: &Unavailable) {
        let text = match reason {
            Unavailable::ColumnsMissing(_) => format!("⚠ {}", reason),
            Unavailable::Empty => "⚠ Data not available for the selected regions.".to_string(),
        };
        ui.label(RichText::new(text).color(WARNING_COLOR));
    }

    /// Latest total cases per region, with value labels above each bar.
    pub fn draw_bar_chart(ui: &mut egui::Ui, data: &RegionValues) {
        let labels: Vec<String> = data.entries.iter().map(|(r, _)| r.clone()).collect();
        let bars: Vec<Bar> = data
            .entries
            .iter()
            .enumerate()
            .map(|(i, (region, v))| Bar::new(i as f64, *v).name(region).fill(BAR_COLOR))
            .collect();

        Plot::new("latest_totals")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Province")
            .y_axis_label("Total Cases (people)")
            .include_y(0.0)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR).name("Total Cases"));
                for (i, (_, v)) in data.entries.iter().enumerate() {
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(i as f64, *v),
                            RichText::new(format_count(*v)).size(11.0),
                        )
                        .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            });
    }

    /// Total cases against total deaths, one labelled point per region.
    pub fn draw_scatter_chart(ui: &mut egui::Ui, data: &CasesVsDeaths) {
        Plot::new("cases_vs_deaths")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Total Cases")
            .y_axis_label("Total Deaths")
            .show(ui, |plot_ui| {
                let points: PlotPoints = data.points.iter().map(|p| [p.cases, p.deaths]).collect();
                plot_ui.points(Points::new(points).radius(5.0).color(SCATTER_COLOR));
                for p in &data.points {
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(p.cases, p.deaths),
                            RichText::new(&p.region).size(11.0),
                        )
                        .anchor(Align2::LEFT_BOTTOM),
                    );
                }
            });
    }

    /// Pie chart of region shares with percentage labels.
    pub fn draw_pie_chart(ui: &mut egui::Ui, data: &RegionValues) {
        let proportions = data.proportions();
        let size = CHART_HEIGHT.min(ui.available_width());
        let (response, painter) = ui.allocate_painter(egui::vec2(size, size), Sense::hover());
        let rect = response.rect;
        let center = rect.center();
        let radius = size * 0.36;

        // Counter-clockwise from 140°.
        let mut angle = 140f32.to_radians();
        for (i, (region, share)) in proportions.iter().enumerate() {
            let sweep = *share as f32 * TAU;
            let color = Self::get_region_color(i);
            let steps = ((sweep / TAU) * 90.0).ceil().max(1.0) as usize;
            for s in 0..steps {
                let a0 = angle + sweep * s as f32 / steps as f32;
                let a1 = angle + sweep * (s + 1) as f32 / steps as f32;
                let p0 = center + radius * egui::vec2(a0.cos(), -a0.sin());
                let p1 = center + radius * egui::vec2(a1.cos(), -a1.sin());
                painter.add(Shape::convex_polygon(vec![center, p0, p1], color, Stroke::NONE));
            }

            let mid = angle + sweep / 2.0;
            let dir = egui::vec2(mid.cos(), -mid.sin());
            painter.text(
                center + dir * radius * 0.6,
                Align2::CENTER_CENTER,
                format!("{:.1}%", share * 100.0),
                FontId::proportional(11.0),
                Color32::WHITE,
            );
            painter.text(
                center + dir * radius * 1.18,
                Align2::CENTER_CENTER,
                region,
                FontId::proportional(12.0),
                ui.visuals().text_color(),
            );
            angle += sweep;
        }
    }

    /// Filled area of the daily national total.
    pub fn draw_area_chart(ui: &mut egui::Ui, data: &DailySeries) {
        let points: Vec<[f64; 2]> = data
            .points
            .iter()
            .map(|(d, v)| [date_to_x(*d), *v])
            .collect();

        Plot::new("daily_trend")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label("Total Cases")
            .include_y(0.0)
            .x_axis_formatter(|mark, _range| {
                x_to_date(mark.value)
                    .map(|d| d.format("%b %Y").to_string())
                    .unwrap_or_default()
            })
            .label_formatter(|_name, value| match x_to_date(value.x) {
                Some(d) => format!("{}\n{}", d.format("%Y-%m-%d"), format_count(value.y)),
                None => String::new(),
            })
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(AREA_COLOR)
                        .fill(0.0)
                        .width(1.5)
                        .name("Total Cases"),
                );
            });
    }

    /// Annotated correlation heatmap.
    pub fn draw_heatmap(ui: &mut egui::Ui, matrix: &CorrelationMatrix) {
        ui.label(
            RichText::new(format!("Based on {} complete rows", format_count(matrix.sample_size as f64)))
                .size(11.0)
                .color(Color32::GRAY),
        );
        let n = matrix.columns.len();
        let label_w = 130.0;
        let cell = ((ui.available_width() - label_w) / n as f32).clamp(36.0, 80.0);
        let header_h = 40.0;
        let size = egui::vec2(label_w + cell * n as f32, header_h + cell * n as f32);
        let (response, painter) = ui.allocate_painter(size, Sense::hover());
        let origin = response.rect.min;
        let text_color = ui.visuals().text_color();

        for (j, metric) in matrix.columns.iter().enumerate() {
            painter.text(
                origin + egui::vec2(label_w + cell * (j as f32 + 0.5), header_h / 2.0),
                Align2::CENTER_CENTER,
                short_label(metric.column_name()),
                FontId::proportional(10.0),
                text_color,
            );
        }

        for (i, metric) in matrix.columns.iter().enumerate() {
            let y = header_h + cell * i as f32;
            painter.text(
                origin + egui::vec2(label_w - 6.0, y + cell / 2.0),
                Align2::RIGHT_CENTER,
                metric.column_name(),
                FontId::proportional(11.0),
                text_color,
            );
            for j in 0..n {
                let r = matrix.values[i][j];
                let min = origin + egui::vec2(label_w + cell * j as f32, y);
                let cell_rect = egui::Rect::from_min_size(min, egui::vec2(cell, cell));
                painter.rect_filled(cell_rect.shrink(0.5), 0.0, heat_color(r));
                let fg = if r.is_nan() || r < 0.25 {
                    Color32::BLACK
                } else {
                    Color32::WHITE
                };
                let label = if r.is_nan() {
                    "nan".to_string()
                } else {
                    format!("{:.2}", r)
                };
                painter.text(
                    cell_rect.center(),
                    Align2::CENTER_CENTER,
                    label,
                    FontId::proportional(11.0),
                    fg,
                );
            }
        }
    }
}

/// "Total Active Cases" → "Total Active\nCases" for narrow column headers.
fn short_label(name: &str) -> String {
    match name.rsplit_once(' ') {
        Some((head, tail)) => format!("{}\n{}", head, tail),
        None => name.to_string(),
    }
}
