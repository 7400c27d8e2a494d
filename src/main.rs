//! COVID-19 Dashboard - Province Case Data & Interactive Chart Viewer
//!
//! Loads the case CSV once, filters it by province and date range, and
//! redraws every chart whenever the selection changes.

mod gui;

use anyhow::Context;
use covid_dashboard::DashboardConfig;
use eframe::egui;
use gui::DashboardApp;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let data_arg = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DashboardConfig::resolve(data_arg).context("loading dashboard config")?;
    info!(data = %config.data_path.display(), "starting dashboard");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("COVID-19 Data Visualisation"),
        ..Default::default()
    };

    eframe::run_native(
        "COVID-19 Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))
}
