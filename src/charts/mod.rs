//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{date_to_x, format_count, heat_color, x_to_date, ChartPlotter};
pub use renderer::{ExportError, StaticChartRenderer};
