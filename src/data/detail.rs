//! Daily detail tables, one per selected region.

use crate::data::record::{CaseRecord, Metric};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub index: usize,
    pub date: NaiveDate,
    pub region: String,
    pub new_cases: Option<f64>,
    pub new_deaths: Option<f64>,
    pub new_recovered: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailTable {
    pub region: String,
    pub rows: Vec<DetailRow>,
}

/// Project the filtered view onto daily figures per region, sorted by date
/// and re-indexed from zero. Tables follow the selection order.
pub fn detail_tables(view: &[CaseRecord], regions: &[String]) -> Vec<DetailTable> {
    regions
        .iter()
        .map(|region| {
            let mut records: Vec<&CaseRecord> =
                view.iter().filter(|r| &r.region == region).collect();
            records.sort_by_key(|r| r.date);

            let rows = records
                .into_iter()
                .enumerate()
                .map(|(index, r)| DetailRow {
                    index,
                    date: r.date,
                    region: r.region.clone(),
                    new_cases: r.get(Metric::NewCases),
                    new_deaths: r.get(Metric::NewDeaths),
                    new_recovered: r.get(Metric::NewRecovered),
                })
                .collect();

            DetailTable {
                region: region.clone(),
                rows,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, d).unwrap()
    }

    #[test]
    fn rows_sorted_by_date_and_reindexed() {
        let records = vec![
            CaseRecord::new("Bali", day(3)).with(Metric::NewCases, 3.0),
            CaseRecord::new("Aceh", day(1)).with(Metric::NewCases, 9.0),
            CaseRecord::new("Bali", day(1)).with(Metric::NewCases, 1.0),
            CaseRecord::new("Bali", day(2)).with(Metric::NewDeaths, 2.0),
        ];
        let tables = detail_tables(&records, &["Bali".to_string(), "Aceh".to_string()]);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].region, "Bali");
        let dates: Vec<NaiveDate> = tables[0].rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        let indices: Vec<usize> = tables[0].rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(tables[0].rows[1].new_deaths, Some(2.0));
        assert_eq!(tables[0].rows[1].new_cases, None);
        assert_eq!(tables[1].rows.len(), 1);
    }

    #[test]
    fn region_without_rows_gets_empty_table() {
        let tables = detail_tables(&[], &["Papua".to_string()]);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].rows.is_empty());
    }
}
