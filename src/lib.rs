//! COVID-19 Dashboard - province case data, filtering and chart aggregations.
//!
//! The library holds everything below the window: CSV loading, the filter
//! engine, per-chart aggregations, the recompute pipeline and chart drawing.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use config::DashboardConfig;
pub use data::{DataLoader, Dataset, FilterCriteria};
pub use pipeline::{ChartSet, DashboardView, Pipeline};
