//! Filter Engine
//! Narrows the dataset by selected regions and an inclusive date range.

use crate::data::frame::{date_lit, frame_to_records};
use crate::data::record::{Capabilities, CaseRecord, Dataset, DATE_COLUMN, REGION_COLUMN};
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

/// Start date after end date. Reported next to the controls; filtering
/// still runs with the range as given.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Start date {start} must not be after end date {end}")]
pub struct InvalidDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Current region and date selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Selected regions, in display order.
    pub regions: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FilterCriteria {
    pub fn new(regions: Vec<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self { regions, start, end }
    }

    /// First `region_count` regions alphabetically, full date range.
    pub fn defaults_for(dataset: &Dataset, region_count: usize) -> Self {
        let regions = dataset.regions().iter().take(region_count).cloned().collect();
        let (start, end) = dataset
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MIN));
        Self { regions, start, end }
    }

    /// Select or deselect a region. Newly selected regions go to the end,
    /// so the selection keeps the order regions were picked in.
    pub fn set_region(&mut self, region: &str, selected: bool) {
        let position = self.regions.iter().position(|r| r == region);
        match (selected, position) {
            (true, None) => self.regions.push(region.to_string()),
            (false, Some(i)) => {
                self.regions.remove(i);
            }
            _ => {}
        }
    }

    pub fn validate(&self) -> Option<InvalidDateRange> {
        (self.start > self.end).then_some(InvalidDateRange {
            start: self.start,
            end: self.end,
        })
    }

    pub fn contains(&self, record: &CaseRecord) -> bool {
        record.date >= self.start
            && record.date <= self.end
            && self.regions.iter().any(|r| r == &record.region)
    }
}

/// Keep a picked date inside the dataset's bounds. An inverted start/end
/// pair is left as is.
pub fn clamp_to(date: NaiveDate, bounds: Option<(NaiveDate, NaiveDate)>) -> NaiveDate {
    match bounds {
        Some((min, max)) => date.clamp(min, max),
        None => date,
    }
}

/// Rows of the dataset matching the current criteria.
///
/// Keeps the filtered frame for grouped queries and its typed rows for
/// per-row work, both in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView {
    frame: DataFrame,
    records: Vec<CaseRecord>,
    capabilities: Capabilities,
}

impl FilteredView {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Filter a normalised case frame by region set and inclusive date range.
pub fn filter_frame(df: &DataFrame, criteria: &FilterCriteria) -> PolarsResult<DataFrame> {
    let selected = Series::new("selected".into(), criteria.regions.as_slice());
    df.clone()
        .lazy()
        .filter(
            col(REGION_COLUMN)
                .is_in(lit(selected))
                .and(col(DATE_COLUMN).gt_eq(date_lit(criteria.start)))
                .and(col(DATE_COLUMN).lt_eq(date_lit(criteria.end))),
        )
        .collect()
}

/// Filtered view over a dataset.
pub fn filter_dataset(dataset: &Dataset, criteria: &FilterCriteria) -> PolarsResult<FilteredView> {
    let capabilities = dataset.capabilities().clone();
    let frame = filter_frame(dataset.frame(), criteria)?;
    let records = frame_to_records(&frame, &capabilities)?;
    debug_assert!(records.iter().all(|r| criteria.contains(r)));
    Ok(FilteredView {
        frame,
        records,
        capabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    fn sample() -> Dataset {
        let mut records = Vec::new();
        for region in ["Aceh", "Bali", "Jakarta"] {
            for d in 1..=3 {
                records.push(CaseRecord::new(region, day(d)));
            }
        }
        Dataset::new("mem.csv", records, Capabilities::all()).unwrap()
    }

    #[test]
    fn single_region_single_day() {
        let ds = sample();
        let criteria = FilterCriteria::new(vec!["Bali".into()], day(2), day(2));
        let view = filter_dataset(&ds, &criteria).unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view.frame().height(), 1);
        assert_eq!(view.records()[0].region, "Bali");
        assert_eq!(view.records()[0].date, day(2));
    }

    #[test]
    fn view_is_sound_and_complete() {
        let ds = sample();
        let criteria = FilterCriteria::new(vec!["Aceh".into(), "Jakarta".into()], day(2), day(3));
        let view = filter_dataset(&ds, &criteria).unwrap();
        assert!(view.records().iter().all(|r| criteria.contains(r)));
        let expected = ds.records().iter().filter(|r| criteria.contains(r)).count();
        assert_eq!(view.len(), expected);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = sample();
        let criteria = FilterCriteria::new(vec!["Bali".into()], day(1), day(2));
        let once = filter_dataset(&ds, &criteria).unwrap();
        let twice = filter_frame(once.frame(), &criteria).unwrap();
        assert!(once.frame().equals_missing(&twice));
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn empty_selection_yields_empty_view() {
        let ds = sample();
        let criteria = FilterCriteria::new(Vec::new(), day(1), day(3));
        assert!(filter_dataset(&ds, &criteria).unwrap().is_empty());
    }

    #[test]
    fn inverted_range_warns_and_yields_empty_view() {
        let ds = sample();
        let criteria = FilterCriteria::new(vec!["Bali".into()], day(3), day(1));
        assert_eq!(
            criteria.validate(),
            Some(InvalidDateRange {
                start: day(3),
                end: day(1)
            })
        );
        assert!(filter_dataset(&ds, &criteria).unwrap().is_empty());
    }

    #[test]
    fn defaults_pick_first_regions_and_full_range() {
        let ds = sample();
        let criteria = FilterCriteria::defaults_for(&ds, 2);
        assert_eq!(criteria.regions, vec!["Aceh".to_string(), "Bali".to_string()]);
        assert_eq!((criteria.start, criteria.end), (day(1), day(3)));
        assert_eq!(criteria.validate(), None);

        let all = FilterCriteria::defaults_for(&ds, 10);
        assert_eq!(all.regions.len(), 3);
    }

    #[test]
    fn selection_keeps_pick_order() {
        let ds = sample();
        let mut criteria = FilterCriteria::new(Vec::new(), day(1), day(3));
        criteria.set_region("Jakarta", true);
        criteria.set_region("Aceh", true);
        criteria.set_region("Jakarta", true);
        assert_eq!(criteria.regions, vec!["Jakarta".to_string(), "Aceh".to_string()]);

        let view = filter_dataset(&ds, &criteria).unwrap();
        assert_eq!(view.len(), 6);

        criteria.set_region("Jakarta", false);
        criteria.set_region("Bali", true);
        assert_eq!(criteria.regions, vec!["Aceh".to_string(), "Bali".to_string()]);
    }

    #[test]
    fn clamp_keeps_dates_within_bounds() {
        let bounds = Some((day(2), day(3)));
        assert_eq!(clamp_to(day(1), bounds), day(2));
        assert_eq!(clamp_to(day(4), bounds), day(3));
        assert_eq!(clamp_to(day(1), None), day(1));
    }
}
