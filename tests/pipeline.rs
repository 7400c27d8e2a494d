use chrono::NaiveDate;
use covid_dashboard::data::{filter_dataset, DataLoader, FilterCriteria, LoaderError, Metric};
use covid_dashboard::stats::Unavailable;
use covid_dashboard::Pipeline;
use std::io::Write;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const FULL: &str = "\
Date,Province,New Cases,New Deaths,New Recovered,Total Cases,Total Deaths,Total Recovered,Total Active Cases
2020-03-03,Bali,3,0,1,6,1,2,3
2020-03-01,Aceh,1,0,0,1,0,0,1
2020-03-01,Bali,1,1,0,1,1,0,0
2020-03-02,Aceh,2,0,1,3,0,1,2
2020-03-02,Bali,2,0,1,3,1,1,1
2020-03-01,Jakarta,5,1,0,5,1,0,4
2020-03-02,Jakarta,7,1,2,12,2,2,8
2020-03-03,Jakarta,9,2,3,21,4,5,12
2020-03-03,Aceh,1,1,1,4,1,2,1
";

#[test]
fn single_region_single_day_view() {
    let file = write_csv(FULL);
    let ds = DataLoader::load_csv(file.path()).unwrap();
    let criteria = FilterCriteria::new(vec!["Bali".into()], date(2020, 3, 2), date(2020, 3, 2));

    let view = filter_dataset(&ds, &criteria).unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view.records()[0].region, "Bali");
    assert_eq!(view.records()[0].date, date(2020, 3, 2));
}

#[test]
fn default_selection_covers_everything() {
    let file = write_csv(FULL);
    let ds = DataLoader::load_csv(file.path()).unwrap();
    let criteria = FilterCriteria::defaults_for(&ds, 3);
    assert_eq!(criteria.regions, vec!["Aceh", "Bali", "Jakarta"]);

    let view = Pipeline::recompute(&ds, &criteria, true).unwrap();
    assert_eq!(view.row_count, 9);
    assert!(view.date_warning.is_none());

    let charts = view.charts.as_ref().unwrap();
    let totals = charts.latest_totals.as_ref().unwrap();
    assert_eq!(
        totals.entries,
        vec![
            ("Aceh".to_string(), 4.0),
            ("Bali".to_string(), 6.0),
            ("Jakarta".to_string(), 21.0)
        ]
    );

    let scatter = charts.cases_vs_deaths.as_ref().unwrap();
    assert_eq!(scatter.points.len(), 3);
    assert_eq!(scatter.points[2].deaths, 4.0);

    let recovered = charts.recovered_share.as_ref().unwrap();
    assert_eq!(recovered.total(), 9.0);

    let trend = charts.daily_trend.as_ref().unwrap();
    assert_eq!(
        trend.points,
        vec![
            (date(2020, 3, 1), 7.0),
            (date(2020, 3, 2), 18.0),
            (date(2020, 3, 3), 31.0)
        ]
    );

    let corr = charts.correlation.as_ref().unwrap();
    assert_eq!(corr.columns.len(), 7);
    assert_eq!(corr.get(Metric::NewCases, Metric::NewCases), Some(1.0));

    assert_eq!(view.details.len(), 3);
    assert_eq!(view.details[1].rows.len(), 3);
    assert_eq!(view.details[1].rows[0].date, date(2020, 3, 1));
}

#[test]
fn daily_trend_matches_raw_totals() {
    let file = write_csv(FULL);
    let ds = DataLoader::load_csv(file.path()).unwrap();
    let criteria = FilterCriteria::new(
        vec!["Bali".into(), "Jakarta".into()],
        date(2020, 3, 1),
        date(2020, 3, 3),
    );
    let raw: f64 = filter_dataset(&ds, &criteria)
        .unwrap()
        .records()
        .iter()
        .filter_map(|r| r.get(Metric::TotalCases))
        .sum();

    let view = Pipeline::recompute(&ds, &criteria, true).unwrap();
    let trend = view.charts.unwrap().daily_trend.unwrap();
    let summed: f64 = trend.points.iter().map(|(_, v)| v).sum();
    assert_eq!(summed, raw);
}

#[test]
fn empty_selection_reports_empty_everywhere() {
    let file = write_csv(FULL);
    let ds = DataLoader::load_csv(file.path()).unwrap();
    let criteria = FilterCriteria::new(Vec::new(), date(2020, 3, 1), date(2020, 3, 3));

    let view = Pipeline::recompute(&ds, &criteria, true).unwrap();
    assert!(view.is_empty());
    let charts = view.charts.unwrap();
    assert_eq!(charts.latest_totals, Err(Unavailable::Empty));
    assert_eq!(charts.cases_vs_deaths, Err(Unavailable::Empty));
    assert_eq!(charts.total_cases_share, Err(Unavailable::Empty));
    assert_eq!(charts.recovered_share, Err(Unavailable::Empty));
    assert_eq!(charts.daily_trend, Err(Unavailable::Empty));
    assert_eq!(charts.correlation, Err(Unavailable::Empty));
    assert!(view.details.is_empty());
}

#[test]
fn missing_deaths_column_only_disables_scatter() {
    let file = write_csv(
        "Date,Province,New Cases,Total Cases\n\
         2020-03-01,Aceh,1,1\n\
         2020-03-02,Aceh,2,3\n\
         2020-03-01,Bali,4,4\n",
    );
    let ds = DataLoader::load_csv(file.path()).unwrap();
    let criteria = FilterCriteria::defaults_for(&ds, 3);

    let charts = Pipeline::recompute(&ds, &criteria, true)
        .unwrap()
        .charts
        .unwrap();
    assert_eq!(
        charts.cases_vs_deaths,
        Err(Unavailable::ColumnsMissing(vec![Metric::TotalDeaths]))
    );
    assert!(charts.latest_totals.is_ok());
    assert!(charts.total_cases_share.is_ok());
    assert!(charts.daily_trend.is_ok());
    assert!(charts.correlation.is_ok());
    assert!(matches!(
        charts.recovered_share,
        Err(Unavailable::ColumnsMissing(_))
    ));
}

#[test]
fn inverted_date_range_warns_with_empty_view() {
    let file = write_csv(
        "Date,Province,Total Cases\n\
         2021-06-01,Bali,10\n\
         2021-06-05,Bali,12\n\
         2021-06-10,Bali,15\n",
    );
    let ds = DataLoader::load_csv(file.path()).unwrap();
    let criteria = FilterCriteria::new(vec!["Bali".into()], date(2021, 6, 10), date(2021, 6, 1));

    let view = Pipeline::recompute(&ds, &criteria, true).unwrap();
    let warning = view.date_warning.unwrap();
    assert_eq!(warning.start, date(2021, 6, 10));
    assert_eq!(warning.end, date(2021, 6, 1));
    assert!(view.is_empty());
}

#[test]
fn missing_file_and_schema_are_fatal() {
    assert!(matches!(
        DataLoader::load_cached("/no/such/covid.csv"),
        Err(LoaderError::DataUnavailable(_))
    ));

    let file = write_csv("Date,Region,Total Cases\n2020-03-01,Bali,1\n");
    assert!(matches!(
        DataLoader::load_cached(file.path()),
        Err(LoaderError::SchemaInvalid { .. })
    ));
}
