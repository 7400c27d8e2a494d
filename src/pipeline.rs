//! Recompute Pipeline
//! Filter → aggregate → detail tables, rebuilt from scratch whenever the
//! selection changes.

use crate::data::{detail_tables, filter_dataset, Dataset, DetailTable, FilterCriteria, InvalidDateRange};
use crate::stats::{
    CaseAggregator, CasesVsDeaths, ChartResult, CorrelationMatrix, DailySeries, RegionValues,
};
use polars::prelude::PolarsResult;
use tracing::{debug, warn};

/// Outputs of every chart for one render pass.
#[derive(Debug, Clone)]
pub struct ChartSet {
    pub latest_totals: ChartResult<RegionValues>,
    pub cases_vs_deaths: ChartResult<CasesVsDeaths>,
    pub total_cases_share: ChartResult<RegionValues>,
    pub recovered_share: ChartResult<RegionValues>,
    pub daily_trend: ChartResult<DailySeries>,
    pub correlation: ChartResult<CorrelationMatrix>,
}

impl ChartSet {
    /// Number of charts with something to draw.
    pub fn available_count(&self) -> usize {
        [
            self.latest_totals.is_ok(),
            self.cases_vs_deaths.is_ok(),
            self.total_cases_share.is_ok(),
            self.recovered_share.is_ok(),
            self.daily_trend.is_ok(),
            self.correlation.is_ok(),
        ]
        .into_iter()
        .filter(|ok| *ok)
        .count()
    }
}

/// Everything the presentation layer needs for one pass.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub date_warning: Option<InvalidDateRange>,
    pub row_count: usize,
    /// `None` when combined charts are switched off.
    pub charts: Option<ChartSet>,
    pub details: Vec<DetailTable>,
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

pub struct Pipeline;

impl Pipeline {
    /// Filter, then run every aggregation. Only a failing frame query is an
    /// error; missing columns and empty selections end up in `ChartSet`.
    pub fn recompute(
        dataset: &Dataset,
        criteria: &FilterCriteria,
        show_combined: bool,
    ) -> PolarsResult<DashboardView> {
        let date_warning = criteria.validate();
        if let Some(w) = &date_warning {
            warn!(start = %w.start, end = %w.end, "invalid date range, filtering anyway");
        }

        let view = filter_dataset(dataset, criteria)?;

        let charts = if show_combined {
            let agg = CaseAggregator::new(&view, &criteria.regions)?;
            Some(ChartSet {
                latest_totals: agg.latest_totals(),
                cases_vs_deaths: agg.cases_vs_deaths(),
                total_cases_share: agg.total_cases_share(),
                recovered_share: agg.recovered_share(),
                daily_trend: agg.national_daily_trend(),
                correlation: agg.correlation(),
            })
        } else {
            None
        };

        let details = detail_tables(view.records(), &criteria.regions);

        debug!(
            regions = criteria.regions.len(),
            rows = view.len(),
            charts = charts.as_ref().map(ChartSet::available_count).unwrap_or(0),
            "recomputed dashboard"
        );

        Ok(DashboardView {
            criteria: criteria.clone(),
            date_warning,
            row_count: view.len(),
            charts,
            details,
        })
    }
}
