//! Case Records
//! Typed rows, the immutable dataset, and the column capability descriptor.

use crate::data::frame::records_to_frame;
use chrono::NaiveDate;
use polars::prelude::{DataFrame, PolarsResult};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Mandatory date column header.
pub const DATE_COLUMN: &str = "Date";
/// Mandatory region column header.
pub const REGION_COLUMN: &str = "Province";

/// Optional numeric columns of the case dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    NewCases,
    NewDeaths,
    NewRecovered,
    TotalCases,
    TotalDeaths,
    TotalRecovered,
    TotalActiveCases,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::NewCases,
        Metric::NewDeaths,
        Metric::NewRecovered,
        Metric::TotalCases,
        Metric::TotalDeaths,
        Metric::TotalRecovered,
        Metric::TotalActiveCases,
    ];

    /// CSV header name for this metric.
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::NewCases => "New Cases",
            Metric::NewDeaths => "New Deaths",
            Metric::NewRecovered => "New Recovered",
            Metric::TotalCases => "Total Cases",
            Metric::TotalDeaths => "Total Deaths",
            Metric::TotalRecovered => "Total Recovered",
            Metric::TotalActiveCases => "Total Active Cases",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One (region, date) observation.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub region: String,
    pub date: NaiveDate,
    values: [Option<f64>; 7],
}

impl CaseRecord {
    pub fn new(region: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            region: region.into(),
            date,
            values: [None; 7],
        }
    }

    /// Builder-style setter, mostly for fixtures.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.values[metric.slot()] = Some(value);
        self
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric.slot()] = value;
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.slot()]
    }
}

/// Which optional columns the loaded file carries.
///
/// Computed once from the header set at load time; aggregations consult it
/// instead of probing columns themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    present: BTreeSet<Metric>,
}

impl Capabilities {
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        let names: BTreeSet<&str> = columns.into_iter().collect();
        let present = Metric::ALL
            .into_iter()
            .filter(|m| names.contains(m.column_name()))
            .collect();
        Self { present }
    }

    #[cfg(test)]
    pub(crate) fn all() -> Self {
        Self {
            present: Metric::ALL.into_iter().collect(),
        }
    }

    pub fn has(&self, metric: Metric) -> bool {
        self.present.contains(&metric)
    }

    /// Required metrics that are absent, in the order requested.
    pub fn missing(&self, required: &[Metric]) -> Vec<Metric> {
        required.iter().copied().filter(|m| !self.has(*m)).collect()
    }

    /// Present metrics, in canonical column order.
    pub fn present(&self) -> Vec<Metric> {
        self.present.iter().copied().collect()
    }
}

/// The loaded case table. Immutable once built.
///
/// Holds the typed rows and their normalised Polars frame side by side; the
/// filter engine queries the frame.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: PathBuf,
    records: Vec<CaseRecord>,
    frame: DataFrame,
    capabilities: Capabilities,
    regions: Vec<String>,
}

impl Dataset {
    pub fn new(
        source: impl AsRef<Path>,
        records: Vec<CaseRecord>,
        capabilities: Capabilities,
    ) -> PolarsResult<Self> {
        let frame = records_to_frame(&records, &capabilities)?;
        let regions: BTreeSet<String> = records.iter().map(|r| r.region.clone()).collect();
        Ok(Self {
            source: source.as_ref().to_path_buf(),
            records,
            frame,
            capabilities,
            regions: regions.into_iter().collect(),
        })
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Distinct region names, sorted alphabetically.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest date in the dataset.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    #[test]
    fn capabilities_follow_header_names() {
        let caps = Capabilities::from_columns(["Date", "Province", "Total Cases", "New Deaths"]);
        assert!(caps.has(Metric::TotalCases));
        assert!(caps.has(Metric::NewDeaths));
        assert!(!caps.has(Metric::TotalDeaths));
        assert_eq!(
            caps.missing(&[Metric::TotalCases, Metric::TotalDeaths]),
            vec![Metric::TotalDeaths]
        );
        assert_eq!(caps.present(), vec![Metric::NewDeaths, Metric::TotalCases]);
    }

    #[test]
    fn dataset_regions_are_sorted_and_distinct() {
        let ds = Dataset::new(
            "mem.csv",
            vec![
                CaseRecord::new("Jakarta", day(2)),
                CaseRecord::new("Aceh", day(3)),
                CaseRecord::new("Jakarta", day(1)),
            ],
            Capabilities::all(),
        )
        .unwrap();
        assert_eq!(ds.frame().height(), 3);
        assert_eq!(ds.regions(), ["Aceh".to_string(), "Jakarta".to_string()]);
        assert_eq!(ds.date_bounds(), Some((day(1), day(3))));
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn empty_dataset_has_no_bounds() {
        let ds = Dataset::new("mem.csv", Vec::new(), Capabilities::default()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.date_bounds(), None);
    }

    #[test]
    fn record_values_default_to_none() {
        let rec = CaseRecord::new("Bali", day(1)).with(Metric::TotalCases, 10.0);
        assert_eq!(rec.get(Metric::TotalCases), Some(10.0));
        assert_eq!(rec.get(Metric::TotalDeaths), None);
    }
}
