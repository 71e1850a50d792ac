use std::path::PathBuf;

use chrono::NaiveDate;

use analog_explorer::data::filter::Granularity;
use analog_explorer::data::loader;
use analog_explorer::data::model::{DecadeBucket, Season};
use analog_explorer::state::{AppState, ChartId};

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "analog-explorer-test-{}-{name}",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Ten January records spanning exactly 30 days.
fn thirty_day_file() -> String {
    let days = [1, 4, 8, 11, 15, 18, 21, 24, 27, 31];
    let mut text = String::from("dateRef\tdateAnlg\tDis\tCorr\n");
    for (i, d) in days.iter().enumerate() {
        let analog_year = if i % 2 == 0 { 1990 } else { 2016 };
        let corr = if i % 2 == 0 { 0.2 } else { 0.8 };
        text.push_str(&format!(
            "200301{d:02}\t{analog_year}0615\t{:.1}\t{corr:.2}\n",
            100.0 + i as f64
        ));
    }
    text
}

#[test]
fn a_thirty_day_dataset_opens_on_its_full_span() {
    let path = write_temp("thirty.tsv", &thirty_day_file());
    let dataset = loader::load_data(&path).unwrap();

    assert_eq!(dataset.len(), 10);
    assert_eq!(dataset.full_range_days, 30);

    let mut app = AppState::default();
    app.set_dataset(dataset);

    // The initial window is the whole dataset, not minDate + 364 days.
    assert_eq!(app.dash.picker_start, date(2003, 1, 1));
    assert_eq!(app.dash.picker_end, date(2003, 1, 31));
    assert_eq!(app.dash.granularity, Granularity::Day);

    // The initial range filter admits every record.
    let agg = app.aggregates.as_ref().unwrap();
    assert_eq!(agg.selected, 10);
    assert_eq!(agg.total, 10);
}

#[test]
fn selections_on_one_chart_recompute_all_the_others() {
    let path = write_temp("linked.tsv", &thirty_day_file());
    let mut app = AppState::default();
    app.set_dataset(loader::load_data(&path).unwrap());

    // Click the recent-decade row: only the 2016 analogues remain.
    app.toggle_decade(DecadeBucket::Y2016);

    let agg = app.aggregates.as_ref().unwrap();
    assert_eq!(agg.selected, 5);
    // Correlation chart only counts the selected decade…
    let corr_02 = agg.corr.iter().find(|&&(b, _)| b == 2).unwrap().1;
    let corr_08 = agg.corr.iter().find(|&&(b, _)| b == 8).unwrap().1;
    assert_eq!((corr_02, corr_08), (0, 5));
    // …while the decade chart itself still shows both rows.
    let own = agg
        .decades
        .iter()
        .find(|&&(d, _)| d == DecadeBucket::Y1986To1995)
        .unwrap()
        .1;
    assert_eq!(own, 5);

    // A reset from the season chart clears the dependent dimensions but
    // keeps the decade selection alive.
    app.toggle_corr_bin(8);
    app.reset_chart(ChartId::Season);
    let agg = app.aggregates.as_ref().unwrap();
    assert_eq!(agg.selected, 5);

    app.reset_all();
    let agg = app.aggregates.as_ref().unwrap();
    assert_eq!(agg.selected, 10);
}

#[test]
fn manual_date_entry_drives_the_time_filter() {
    let path = write_temp("manual.tsv", &thirty_day_file());
    let mut app = AppState::default();
    app.set_dataset(loader::load_data(&path).unwrap());

    app.manual_dates(date(2003, 1, 4), date(2003, 1, 15));
    let agg = app.aggregates.as_ref().unwrap();
    // Days 4, 8, 11, 15 fall inside the closed range.
    assert_eq!(agg.selected, 4);
    assert_eq!(app.dash.granularity, Granularity::Day);

    // Reversed input alerts and falls back to the full range.
    app.manual_dates(date(2003, 1, 20), date(2003, 1, 4));
    assert!(app.dash.alert.is_some());
    let agg = app.aggregates.as_ref().unwrap();
    assert_eq!(agg.selected, 10);
}

#[test]
fn records_of_every_season_survive_a_full_year() {
    // One record per month start; seasons must cover the whole year.
    let mut text = String::from("dateRef\tdateAnlg\tDis\tCorr\n");
    for month in 1..=12 {
        text.push_str(&format!("2003{month:02}01\t19900615\t100.0\t0.50\n"));
    }
    let path = write_temp("year.tsv", &text);
    let mut app = AppState::default();
    app.set_dataset(loader::load_data(&path).unwrap());

    app.reset_all();
    let agg = app.aggregates.as_ref().unwrap();
    let per_season: Vec<usize> = Season::ALL
        .iter()
        .map(|s| agg.seasons.iter().find(|&&(k, _)| k == *s).unwrap().1)
        .collect();
    assert_eq!(per_season, vec![3, 3, 3, 3]);
}

#[test]
fn the_run_configuration_is_loaded_verbatim() {
    let text = "outputfile = analogs.tsv\n\
                nanalog = 20\n\
                varname = \"slp\"\n\
                simsource = \"NCEP\"\n\
                archisource = \"NCEP\"\n\
                predictordom = \"-80.0,50.0,22.5,70.0\"\n\
                archiperiod = \"1948-01-01,2016-12-31\"\n";
    let path = write_temp("config.txt", text);
    let config = loader::load_config(&path).unwrap();

    assert_eq!(config.nanalog, "20");
    assert_eq!(config.ref_start, "01/01/1948");
    assert_eq!(config.ref_end, "31/12/2016");

    let mut app = AppState::default();
    app.set_config(config);
    assert!(app.config.is_some());
}
