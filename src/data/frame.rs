//! Frame conversion
//! Normalised Polars layout of the case table: `Province` (String),
//! `Date` (Date) and one Float64 column per present metric.

use crate::data::record::{Capabilities, CaseRecord, DATE_COLUMN, REGION_COLUMN};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// 1970-01-01 counted from 0001-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since the Unix epoch, the physical value of a Polars `Date`.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Date literal for lazy comparisons against the `Date` column.
pub fn date_lit(date: NaiveDate) -> Expr {
    lit(epoch_days(date)).cast(DataType::Date)
}

/// Build the normalised frame from typed records.
pub fn records_to_frame(
    records: &[CaseRecord],
    capabilities: &Capabilities,
) -> PolarsResult<DataFrame> {
    let regions: Vec<&str> = records.iter().map(|r| r.region.as_str()).collect();
    let days: Vec<i32> = records.iter().map(|r| epoch_days(r.date)).collect();

    let mut columns = vec![
        Column::new(REGION_COLUMN.into(), regions),
        Column::new(DATE_COLUMN.into(), days).cast(&DataType::Date)?,
    ];
    for metric in capabilities.present() {
        let values: Vec<Option<f64>> = records.iter().map(|r| r.get(metric)).collect();
        columns.push(Column::new(metric.column_name().into(), values));
    }

    DataFrame::new(columns)
}

/// Read typed records back out of a normalised frame, in row order.
pub fn frame_to_records(
    df: &DataFrame,
    capabilities: &Capabilities,
) -> PolarsResult<Vec<CaseRecord>> {
    let regions = df.column(REGION_COLUMN)?.cast(&DataType::String)?;
    let regions = regions.as_materialized_series().str()?.clone();
    let days = df.column(DATE_COLUMN)?.cast(&DataType::Int32)?;
    let days = days.as_materialized_series().i32()?.clone();

    let mut metric_values = Vec::new();
    for metric in capabilities.present() {
        let cast = df.column(metric.column_name())?.cast(&DataType::Float64)?;
        metric_values.push((metric, cast.as_materialized_series().f64()?.clone()));
    }

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let (Some(region), Some(date)) = (regions.get(i), days.get(i).and_then(from_epoch_days))
        else {
            continue;
        };
        let mut record = CaseRecord::new(region, date);
        for (metric, values) in &metric_values {
            record.set(*metric, values.get(i));
        }
        records.push(record);
    }
    Ok(records)
}
