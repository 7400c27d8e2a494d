//! CSV Data Loader Module
//! Reads the case CSV with Polars and converts it into a typed `Dataset`.

use crate::data::record::{Capabilities, CaseRecord, Dataset, Metric, DATE_COLUMN, REGION_COLUMN};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data file not found: {}", .0.display())]
    DataUnavailable(PathBuf),
    #[error("Required column '{column}' not found in data")]
    SchemaInvalid { column: String },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Accepted day-level date layouts, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse a calendar date, tolerating a trailing time component.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim().trim_matches('"');
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    // "2020-03-01 00:00:00" / "2020-03-01T00:00:00"
    raw.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

type DatasetCache = HashMap<PathBuf, Arc<Dataset>>;

/// Process-wide dataset cache, keyed by source path.
///
/// Entries are never mutated after insertion, so a guard poisoned by a
/// panicking loader thread is still consistent and gets recovered.
fn cache() -> MutexGuard<'static, DatasetCache> {
    static CACHE: OnceLock<Mutex<DatasetCache>> = OnceLock::new();
    CACHE
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("dataset cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a dataset once per session. Repeated calls with the same path
    /// return the same shared `Dataset` without touching the file again.
    pub fn load_cached(path: impl AsRef<Path>) -> Result<Arc<Dataset>, LoaderError> {
        let path = path.as_ref();
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(ds) = cache().get(&key).cloned() {
            debug!(path = %key.display(), "dataset cache hit");
            return Ok(ds);
        }

        let ds = Arc::new(Self::load_csv(path)?);
        // A concurrent loader may have won the race; keep the first entry.
        Ok(cache().entry(key).or_insert(ds).clone())
    }

    /// Load a CSV file into a typed dataset, bypassing the cache.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset, LoaderError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoaderError::DataUnavailable(path.to_path_buf()));
        }

        // Infer over every row: a float after the first few thousand integer
        // rows must not be nulled by `ignore_errors`.
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(None)
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        let ds = Self::dataset_from_frame(&df, path)?;
        info!(
            path = %path.display(),
            rows = ds.len(),
            regions = ds.regions().len(),
            metrics = ?ds.capabilities().present(),
            "dataset loaded"
        );
        Ok(ds)
    }

    /// Convert a loaded frame into typed records.
    ///
    /// Rows with a null region or a date that parses under no accepted layout
    /// are dropped and counted.
    pub fn dataset_from_frame(df: &DataFrame, source: &Path) -> Result<Dataset, LoaderError> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for required in [DATE_COLUMN, REGION_COLUMN] {
            if !columns.iter().any(|c| c == required) {
                return Err(LoaderError::SchemaInvalid {
                    column: required.to_string(),
                });
            }
        }

        let capabilities = Capabilities::from_columns(columns.iter().map(String::as_str));

        let dates = df.column(DATE_COLUMN)?.cast(&DataType::String)?;
        let dates = dates.as_materialized_series().str()?.clone();
        let regions = df.column(REGION_COLUMN)?.cast(&DataType::String)?;
        let regions = regions.as_materialized_series().str()?.clone();

        let mut metric_values: Vec<(Metric, Float64Chunked)> = Vec::new();
        for metric in capabilities.present() {
            let cast = df.column(metric.column_name())?.cast(&DataType::Float64)?;
            metric_values.push((metric, cast.as_materialized_series().f64()?.clone()));
        }

        let mut records = Vec::with_capacity(df.height());
        let mut dropped = 0usize;

        for i in 0..df.height() {
            let region = regions.get(i).map(str::trim).filter(|r| !r.is_empty());
            let date = dates.get(i).and_then(parse_date);
            let (Some(region), Some(date)) = (region, date) else {
                dropped += 1;
                continue;
            };

            let mut record = CaseRecord::new(region, date);
            for (metric, values) in &metric_values {
                record.set(*metric, values.get(i).filter(|v| v.is_finite()));
            }
            records.push(record);
        }

        if dropped > 0 {
            warn!(dropped, "skipped rows with missing region or unparseable date");
        }

        Ok(Dataset::new(source, records, capabilities)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn parse_date_accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        assert_eq!(parse_date("2020-03-02"), Some(expected));
        assert_eq!(parse_date("3/2/2020"), Some(expected));
        assert_eq!(parse_date("2020/03/02"), Some(expected));
        assert_eq!(parse_date("2020-03-02 00:00:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let err = DataLoader::load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, LoaderError::DataUnavailable(_)));
    }

    #[test]
    fn missing_region_column_is_schema_invalid() {
        let file = write_csv("Date,Total Cases\n2020-03-01,5\n");
        let err = DataLoader::load_csv(file.path()).unwrap_err();
        match err {
            LoaderError::SchemaInvalid { column } => assert_eq!(column, "Province"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_date_column_is_schema_invalid() {
        let file = write_csv("Province,Total Cases\nBali,5\n");
        let err = DataLoader::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, LoaderError::SchemaInvalid { ref column } if column == "Date"));
    }

    #[test]
    fn loads_records_and_capabilities() {
        let file = write_csv(
            "Date,Province,Total Cases,New Cases\n\
             2020-03-01,Bali,5,5\n\
             2020-03-02,Bali,,2\n\
             garbage,Bali,9,9\n\
             2020-03-01,Aceh,1,1\n",
        );
        let ds = DataLoader::load_csv(file.path()).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.regions(), ["Aceh".to_string(), "Bali".to_string()]);
        assert!(ds.capabilities().has(Metric::TotalCases));
        assert!(!ds.capabilities().has(Metric::TotalDeaths));

        let second = &ds.records()[1];
        assert_eq!(second.region, "Bali");
        assert_eq!(second.get(Metric::TotalCases), None);
        assert_eq!(second.get(Metric::NewCases), Some(2.0));
    }

    #[test]
    fn late_float_after_integer_rows_is_kept() {
        let mut csv = String::from("Date,Province,Total Cases\n");
        for i in 0..10_005 {
            csv.push_str(&format!("2020-03-01,Aceh,{}\n", i));
        }
        csv.push_str("2020-03-02,Bali,12.5\n");
        let file = write_csv(&csv);

        let ds = DataLoader::load_csv(file.path()).unwrap();
        assert_eq!(ds.len(), 10_006);
        let last = ds.records().last().unwrap();
        assert_eq!(last.region, "Bali");
        assert_eq!(last.get(Metric::TotalCases), Some(12.5));
    }

    #[test]
    fn cached_load_returns_same_dataset() {
        let file = write_csv("Date,Province,Total Cases\n2020-03-01,Bali,5\n");
        let first = DataLoader::load_cached(file.path()).unwrap();
        let second = DataLoader::load_cached(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
