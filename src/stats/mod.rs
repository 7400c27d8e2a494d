//! Stats module - chart aggregations and correlation

mod aggregate;
mod correlation;

pub use aggregate::{
    latest_per_region, CaseAggregator, CasesVsDeaths, ChartResult, DailySeries, RegionPoint,
    RegionValues, Unavailable,
};
pub use correlation::{pearson, CorrelationMatrix};
