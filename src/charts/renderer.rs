//! Static Chart Renderer
//! Writes the available dashboard charts to PNG files with plotters.
//!
//! One file per chart:
//! 1. latest_totals.png   - bar chart of latest total cases
//! 2. cases_vs_deaths.png - labelled scatter
//! 3. total_cases_share.png / recovered_share.png - pies
//! 4. daily_trend.png     - area chart
//! 5. correlation.png     - annotated heatmap

use crate::charts::plotter::{date_to_x, format_count, heat_color, x_to_date, PALETTE};
use crate::pipeline::DashboardView;
use crate::stats::{CasesVsDeaths, CorrelationMatrix, DailySeries, RegionValues};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create export directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> ExportError {
    ExportError::Draw(e.to_string())
}

const BAR: RGBColor = RGBColor(255, 165, 0);
const POINT: RGBColor = RGBColor(52, 152, 219);
const AREA: RGBColor = RGBColor(46, 139, 87);
const FONT: &str = "sans-serif";

fn text_style(size: f64, color: &'static RGBColor, h: HPos, v: VPos) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font())
        .color(color)
        .pos(Pos::new(h, v))
}

fn palette(i: usize) -> RGBColor {
    let c = PALETTE[i % PALETTE.len()];
    RGBColor(c.r(), c.g(), c.b())
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every available chart of `view` into `dir`. Charts that are
    /// unavailable, or switched off, are skipped.
    pub fn export_all(
        view: &DashboardView,
        dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let Some(charts) = &view.charts else {
            return Ok(Vec::new());
        };
        fs::create_dir_all(dir)?;

        let size = (width, height);
        let mut written = Vec::new();

        if let Ok(data) = &charts.latest_totals {
            let path = dir.join("latest_totals.png");
            Self::render_bar(&path, size, data)?;
            written.push(path);
        }
        if let Ok(data) = &charts.cases_vs_deaths {
            let path = dir.join("cases_vs_deaths.png");
            Self::render_scatter(&path, size, data)?;
            written.push(path);
        }
        if let Ok(data) = &charts.total_cases_share {
            let path = dir.join("total_cases_share.png");
            Self::render_pie(&path, size, data, "Total Cases Share")?;
            written.push(path);
        }
        if let Ok(data) = &charts.recovered_share {
            let path = dir.join("recovered_share.png");
            Self::render_pie(&path, size, data, "Total Recovered Share")?;
            written.push(path);
        }
        if let Ok(data) = &charts.daily_trend {
            let path = dir.join("daily_trend.png");
            Self::render_area(&path, size, data)?;
            written.push(path);
        }
        if let Ok(data) = &charts.correlation {
            let path = dir.join("correlation.png");
            Self::render_heatmap(&path, size, data)?;
            written.push(path);
        }

        info!(dir = %dir.display(), files = written.len(), "charts exported");
        Ok(written)
    }

    fn open(path: &Path, size: (u32, u32)) -> Result<Area<'_>, ExportError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        Ok(root)
    }

    pub fn render_bar(path: &Path, size: (u32, u32), data: &RegionValues) -> Result<(), ExportError> {
        let root = Self::open(path, size)?;
        let n = data.entries.len();
        let y_max = data.entries.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1.0) * 1.1;

        let mut chart = ChartBuilder::on(&root)
            .caption("Latest Total COVID-19 Cases", (FONT, 26))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Province")
            .y_desc("Total Cases (people)")
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(i) => data
                    .entries
                    .get(*i)
                    .map(|(r, _)| r.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|y| format_count(*y))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BAR.filled())
                    .margin(12)
                    .data(data.entries.iter().enumerate().map(|(i, (_, v))| (i, *v))),
            )
            .map_err(draw_err)?;

        chart
            .draw_series(data.entries.iter().enumerate().map(|(i, (_, v))| {
                Text::new(
                    format_count(*v),
                    (SegmentValue::CenterOf(i), *v),
                    text_style(14.0, &BLACK, HPos::Center, VPos::Bottom),
                )
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    pub fn render_scatter(path: &Path, size: (u32, u32), data: &CasesVsDeaths) -> Result<(), ExportError> {
        let root = Self::open(path, size)?;
        let x_max = data.points.iter().map(|p| p.cases).fold(0.0, f64::max).max(1.0) * 1.15;
        let y_max = data.points.iter().map(|p| p.deaths).fold(0.0, f64::max).max(1.0) * 1.15;

        let mut chart = ChartBuilder::on(&root)
            .caption("Total Cases vs Total Deaths", (FONT, 26))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Total Cases")
            .y_desc("Total Deaths")
            .x_label_formatter(&|x| format_count(*x))
            .y_label_formatter(&|y| format_count(*y))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(data.points.iter().map(|p| {
                EmptyElement::at((p.cases, p.deaths))
                    + Circle::new((0, 0), 6, POINT.filled())
                    + Text::new(p.region.clone(), (8, -14), text_style(14.0, &BLACK, HPos::Left, VPos::Top))
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    pub fn render_pie(
        path: &Path,
        size: (u32, u32),
        data: &RegionValues,
        title: &str,
    ) -> Result<(), ExportError> {
        let root = Self::open(path, size)?;
        root.titled(title, (FONT, 26)).map_err(draw_err)?;

        let (w, h) = size;
        let center = (w as f64 / 2.0, h as f64 / 2.0 + 15.0);
        let radius = (w.min(h) as f64) * 0.32;
        let at = |angle: f64, r: f64| {
            (
                (center.0 + r * angle.cos()).round() as i32,
                (center.1 - r * angle.sin()).round() as i32,
            )
        };

        let mut angle = 140f64.to_radians();
        for (i, (region, share)) in data.proportions().iter().enumerate() {
            let sweep = share * TAU;
            let steps = ((sweep / TAU) * 180.0).ceil().max(1.0) as usize;
            let mut outline = vec![at(0.0, 0.0)];
            for s in 0..=steps {
                outline.push(at(angle + sweep * s as f64 / steps as f64, radius));
            }
            root.draw(&Polygon::new(outline, palette(i).filled()))
                .map_err(draw_err)?;

            let mid = angle + sweep / 2.0;
            root.draw(&Text::new(
                format!("{:.1}%", share * 100.0),
                at(mid, radius * 0.6),
                text_style(16.0, &WHITE, HPos::Center, VPos::Center),
            ))
            .map_err(draw_err)?;
            root.draw(&Text::new(
                region.clone(),
                at(mid, radius * 1.15),
                text_style(16.0, &BLACK, HPos::Center, VPos::Center),
            ))
            .map_err(draw_err)?;
            angle += sweep;
        }

        root.present().map_err(draw_err)
    }

    pub fn render_area(path: &Path, size: (u32, u32), data: &DailySeries) -> Result<(), ExportError> {
        let root = Self::open(path, size)?;
        let points: Vec<(f64, f64)> = data.points.iter().map(|(d, v)| (date_to_x(*d), *v)).collect();
        let x_min = points.first().map(|p| p.0).unwrap_or(0.0);
        // Single-day series still need a non-empty x range.
        let x_max = points.last().map(|p| p.0).unwrap_or(0.0).max(x_min + 1.0);
        let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max).max(1.0) * 1.1;

        let mut chart = ChartBuilder::on(&root)
            .caption("National Total Cases per Day (Selected Provinces)", (FONT, 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(8)
            .x_desc("Date")
            .y_desc("Total Cases")
            .x_label_formatter(&|x| {
                x_to_date(*x)
                    .map(|d| d.format("%b %Y").to_string())
                    .unwrap_or_default()
            })
            .y_label_formatter(&|y| format_count(*y))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(
                AreaSeries::new(points.iter().copied(), 0.0, AREA.mix(0.4)).border_style(AREA),
            )
            .map_err(draw_err)?;

        root.present().map_err(draw_err)
    }

    pub fn render_heatmap(
        path: &Path,
        size: (u32, u32),
        matrix: &CorrelationMatrix,
    ) -> Result<(), ExportError> {
        let root = Self::open(path, size)?;
        let title = format!(
            "Case Correlation Heatmap ({} complete rows)",
            matrix.sample_size
        );
        root.titled(&title, (FONT, 26)).map_err(draw_err)?;

        let (w, h) = size;
        let n = matrix.columns.len() as i32;
        let label_w = 190;
        let header_h = 60;
        let cell = ((w as i32 - label_w - 40) / n).min((h as i32 - header_h - 80) / n).max(10);
        let x0 = label_w;
        let y0 = header_h + 40;

        for (j, metric) in matrix.columns.iter().enumerate() {
            let x = x0 + cell * j as i32 + cell / 2;
            root.draw(&Text::new(
                metric.column_name(),
                (x, y0 - 10),
                text_style(13.0, &BLACK, HPos::Center, VPos::Bottom),
            ))
            .map_err(draw_err)?;
        }

        for (i, metric) in matrix.columns.iter().enumerate() {
            let y = y0 + cell * i as i32;
            root.draw(&Text::new(
                metric.column_name(),
                (x0 - 8, y + cell / 2),
                text_style(14.0, &BLACK, HPos::Right, VPos::Center),
            ))
            .map_err(draw_err)?;

            for j in 0..matrix.columns.len() {
                let r = matrix.values[i][j];
                let x = x0 + cell * j as i32;
                let c = heat_color(r);
                root.draw(&Rectangle::new(
                    [(x, y), (x + cell - 1, y + cell - 1)],
                    RGBColor(c.r(), c.g(), c.b()).filled(),
                ))
                .map_err(draw_err)?;

                let fg: &'static RGBColor = if r.is_nan() || r < 0.25 { &BLACK } else { &WHITE };
                let label = if r.is_nan() {
                    "nan".to_string()
                } else {
                    format!("{:.2}", r)
                };
                root.draw(&Text::new(
                    label,
                    (x + cell / 2, y + cell / 2),
                    text_style(15.0, fg, HPos::Center, VPos::Center),
                ))
                .map_err(draw_err)?;
            }
        }

        root.present().map_err(draw_err)
    }
}
