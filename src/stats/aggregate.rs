//! Chart Aggregations
//! Per-chart reductions over the filtered view: latest value per region,
//! daily national sum, and the correlation matrix.

use crate::data::{
    frame_to_records, from_epoch_days, Capabilities, CaseRecord, FilteredView, Metric,
    DATE_COLUMN, REGION_COLUMN,
};
use crate::stats::correlation::CorrelationMatrix;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

/// Why a chart has nothing to show. Rendered as an inline notice, never
/// as a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    #[error("Required columns not found: {}", format_metrics(.0))]
    ColumnsMissing(Vec<Metric>),
    #[error("No data available for the current selection")]
    Empty,
}

fn format_metrics(metrics: &[Metric]) -> String {
    metrics
        .iter()
        .map(|m| m.column_name())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ChartResult<T> = Result<T, Unavailable>;

/// Region → value mapping in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionValues {
    pub entries: Vec<(String, f64)>,
}

impl RegionValues {
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    /// Each region's share of the total; empty when the total is zero.
    pub fn proportions(&self) -> Vec<(String, f64)> {
        let total = self.total();
        if total <= 0.0 {
            return Vec::new();
        }
        self.entries
            .iter()
            .map(|(region, v)| (region.clone(), v / total))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionPoint {
    pub region: String,
    pub cases: f64,
    pub deaths: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CasesVsDeaths {
    pub points: Vec<RegionPoint>,
}

/// Date-ascending daily sums.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub points: Vec<(NaiveDate, f64)>,
}

/// Runs the chart reductions for one filtered view.
///
/// The grouped tables (latest row per region, per-date sums) are queried
/// from the view's frame once, up front; the chart accessors only read them.
pub struct CaseAggregator<'a> {
    view: &'a FilteredView,
    regions: &'a [String],
    latest: HashMap<String, CaseRecord>,
    daily: Vec<(NaiveDate, f64)>,
}

impl<'a> CaseAggregator<'a> {
    pub fn new(view: &'a FilteredView, regions: &'a [String]) -> PolarsResult<Self> {
        let daily = if view.capabilities().has(Metric::TotalCases) {
            daily_sums(view.frame(), Metric::TotalCases)?
        } else {
            Vec::new()
        };
        Ok(Self {
            view,
            regions,
            latest: latest_per_region(view)?,
            daily,
        })
    }

    fn capabilities(&self) -> &Capabilities {
        self.view.capabilities()
    }

    fn require(&self, metrics: &[Metric]) -> ChartResult<()> {
        let missing = self.capabilities().missing(metrics);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Unavailable::ColumnsMissing(missing))
        }
    }

    fn latest_value(&self, region: &str, metric: Metric) -> Option<f64> {
        self.latest.get(region).and_then(|r| r.get(metric))
    }

    /// Latest total cases per selected region; regions without data count as 0.
    pub fn latest_totals(&self) -> ChartResult<RegionValues> {
        self.require(&[Metric::TotalCases])?;
        if self.regions.is_empty() {
            return Err(Unavailable::Empty);
        }
        let entries = self
            .regions
            .iter()
            .map(|region| {
                let value = self.latest_value(region, Metric::TotalCases).unwrap_or(0.0);
                (region.clone(), value)
            })
            .collect();
        Ok(RegionValues { entries })
    }

    /// Latest (total cases, total deaths) per region; incomplete regions dropped.
    pub fn cases_vs_deaths(&self) -> ChartResult<CasesVsDeaths> {
        self.require(&[Metric::TotalCases, Metric::TotalDeaths])?;
        let points: Vec<RegionPoint> = self
            .regions
            .iter()
            .filter_map(|region| {
                let cases = self.latest_value(region, Metric::TotalCases)?;
                let deaths = self.latest_value(region, Metric::TotalDeaths)?;
                Some(RegionPoint {
                    region: region.clone(),
                    cases,
                    deaths,
                })
            })
            .collect();
        if points.is_empty() {
            return Err(Unavailable::Empty);
        }
        Ok(CasesVsDeaths { points })
    }

    /// Latest total cases per region for the proportion chart.
    pub fn total_cases_share(&self) -> ChartResult<RegionValues> {
        self.latest_share(Metric::TotalCases)
    }

    /// Latest total recovered per region for the proportion chart.
    pub fn recovered_share(&self) -> ChartResult<RegionValues> {
        self.latest_share(Metric::TotalRecovered)
    }

    fn latest_share(&self, metric: Metric) -> ChartResult<RegionValues> {
        self.require(&[metric])?;
        let entries: Vec<(String, f64)> = self
            .regions
            .iter()
            .filter_map(|region| Some((region.clone(), self.latest_value(region, metric)?)))
            .collect();
        let values = RegionValues { entries };
        if values.entries.is_empty() || values.total() <= 0.0 {
            return Err(Unavailable::Empty);
        }
        Ok(values)
    }

    /// Total cases summed over the selected regions for each date.
    pub fn national_daily_trend(&self) -> ChartResult<DailySeries> {
        self.require(&[Metric::TotalCases])?;
        if self.daily.is_empty() {
            return Err(Unavailable::Empty);
        }
        Ok(DailySeries {
            points: self.daily.clone(),
        })
    }

    pub fn correlation(&self) -> ChartResult<CorrelationMatrix> {
        CorrelationMatrix::compute(self.view.records(), self.capabilities())
    }
}

/// Record with the maximum date for each region. On equal dates the later
/// row wins: the stable sort keeps dataset order among ties.
pub fn latest_per_region(view: &FilteredView) -> PolarsResult<HashMap<String, CaseRecord>> {
    let capabilities = view.capabilities();
    let mut aggs = vec![col(DATE_COLUMN).last()];
    aggs.extend(
        capabilities
            .present()
            .into_iter()
            .map(|m| col(m.column_name()).last()),
    );

    let latest = view
        .frame()
        .clone()
        .lazy()
        .sort_by_exprs(
            [col(DATE_COLUMN)],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .group_by_stable([col(REGION_COLUMN)])
        .agg(aggs)
        .collect()?;

    Ok(frame_to_records(&latest, capabilities)?
        .into_iter()
        .map(|r| (r.region.clone(), r))
        .collect())
}

/// Per-date sum of one metric, date ascending. Nulls count as 0.
fn daily_sums(frame: &DataFrame, metric: Metric) -> PolarsResult<Vec<(NaiveDate, f64)>> {
    let name = metric.column_name();
    let daily = frame
        .clone()
        .lazy()
        .group_by([col(DATE_COLUMN)])
        .agg([col(name).sum()])
        .sort_by_exprs([col(DATE_COLUMN)], SortMultipleOptions::default())
        .collect()?;

    let days = daily.column(DATE_COLUMN)?.cast(&DataType::Int32)?;
    let sums = daily.column(name)?.cast(&DataType::Float64)?;
    let days = days.as_materialized_series().i32()?;
    let sums = sums.as_materialized_series().f64()?;

    Ok(days
        .into_iter()
        .zip(sums)
        .filter_map(|(day, sum)| Some((from_epoch_days(day?)?, sum.unwrap_or(0.0))))
        .collect())
}
