use std::path::PathBuf;

use sensorlog_parser::{
    aggregate::list_candidates, load, HeaderSpan, LoadError, LoadOptions, LoadRequest,
    SkipReason, SourceFormat,
};

fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn file_names(paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|path| {
            path.file_name()
                .expect("file name")
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

#[test]
fn listing_matches_extension_case_insensitively() {
    let paths = list_candidates(&fixture_dir("site")).expect("listing failed");
    assert_eq!(
        file_names(paths),
        vec!["PVsyst_model.csv", "day1.csv", "day2.CSV"]
    );
}

#[test]
fn normal_mode_skips_model_exports() {
    let request = LoadRequest::new(fixture_dir("site"), SourceFormat::Generic);
    let report = load(&request, &LoadOptions::default()).expect("aggregate load failed");

    assert_eq!(report.table.height(), 5);
    assert_eq!(report.loaded.len(), 2);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::ModelExport);
    assert_eq!(
        file_names(report.skipped.iter().map(|skip| skip.path.clone())),
        vec!["PVsyst_model.csv"]
    );

    let keys: Vec<&str> = report
        .table
        .column_keys()
        .iter()
        .map(|key| key.as_str())
        .collect();
    assert_eq!(keys, vec!["POA", "GHI"]);
}

#[test]
fn rows_follow_file_order() {
    let request = LoadRequest::new(fixture_dir("site"), SourceFormat::Generic);
    let report = load(&request, &LoadOptions::default()).expect("aggregate load failed");

    let display = report.table.display_index();
    assert_eq!(display.first().map(String::as_str), Some("07/01/2024 10 00"));
    assert_eq!(display.last().map(String::as_str), Some("07/02/2024 10 05"));
    assert_eq!(
        report.loaded.iter().map(|file| file.rows).collect::<Vec<_>>(),
        vec![3, 2]
    );
}

#[test]
fn model_export_mode_reads_only_marked_files() {
    let request =
        LoadRequest::new(fixture_dir("site"), SourceFormat::Generic).with_model_exports(true);
    let report = load(&request, &LoadOptions::default()).expect("model export load failed");

    assert_eq!(report.table.height(), 3);
    assert_eq!(report.skipped_count(), 2);
    assert!(report
        .skipped
        .iter()
        .all(|skip| skip.reason == SkipReason::NotModelExport));
    assert!(report.table.column("TAmb").is_some());
}

#[test]
fn marker_token_is_configurable() {
    let options = LoadOptions {
        model_export_marker: "DAY2".to_string(),
        ..LoadOptions::default()
    };
    let request = LoadRequest::new(fixture_dir("site"), SourceFormat::Generic);
    let report = load(&request, &options).expect("aggregate load failed");

    assert_eq!(
        file_names(report.skipped.iter().map(|skip| skip.path.clone())),
        vec!["day2.CSV"]
    );
    assert_eq!(
        file_names(report.loaded.iter().map(|file| file.path.clone())),
        vec!["PVsyst_model.csv", "day1.csv"]
    );
}

#[test]
fn empty_marker_is_rejected_before_listing() {
    let options = LoadOptions {
        model_export_marker: "  ".to_string(),
        ..LoadOptions::default()
    };
    let request =
        LoadRequest::new(fixture_dir("site"), SourceFormat::Generic).with_model_exports(true);
    let err = load(&request, &options).unwrap_err();
    assert!(matches!(err, LoadError::EmptyModelExportMarker));
}

#[test]
fn loaded_files_report_header_span() {
    let request = LoadRequest::new(fixture_dir("outer_join"), SourceFormat::Generic);
    let report = load(&request, &LoadOptions::default()).expect("aggregate load failed");

    assert!(report
        .loaded
        .iter()
        .all(|file| file.header_rows == 1 && file.header_span == HeaderSpan(0)));
}

#[test]
fn differing_column_sets_are_outer_joined() {
    let request = LoadRequest::new(fixture_dir("outer_join"), SourceFormat::Generic);
    let report = load(&request, &LoadOptions::default()).expect("aggregate load failed");

    assert_eq!(report.table.height(), 3);
    assert_eq!(
        report.table.column("GHI").expect("GHI"),
        &[Some(750.2), Some(752.9), None]
    );
    assert_eq!(
        report.table.column("Wind").expect("Wind"),
        &[None, None, Some(3.2)]
    );
    assert_eq!(
        report.table.column("POA").expect("POA"),
        &[Some(800.1), Some(805.4), Some(790.0)]
    );
}

#[test]
fn loading_a_file_twice_doubles_rows() {
    let single = load(
        &LoadRequest::new(fixture_dir("duplicate"), SourceFormat::Generic)
            .with_file_name("copy_a.csv"),
        &LoadOptions::default(),
    )
    .expect("single load failed");
    let doubled = load(
        &LoadRequest::new(fixture_dir("duplicate"), SourceFormat::Generic),
        &LoadOptions::default(),
    )
    .expect("aggregate load failed");

    assert_eq!(doubled.table.height(), single.table.height() * 2);
    assert_eq!(doubled.table.column_keys(), single.table.column_keys());
    assert_eq!(doubled.loaded[0].hash, doubled.loaded[1].hash);
}

#[test]
fn single_file_request_skips_filtering() {
    let request = LoadRequest::new(fixture_dir("site"), SourceFormat::ModelExport)
        .with_file_name("PVsyst_model.csv");
    let report = load(&request, &LoadOptions::default()).expect("single file load failed");

    assert_eq!(report.table.height(), 3);
    assert_eq!(report.skipped_count(), 0);
}

#[test]
fn path_to_a_file_loads_that_file() {
    let request = LoadRequest::new(fixture_dir("site").join("day1.csv"), SourceFormat::Generic);
    let report = load(&request, &LoadOptions::default()).expect("single file load failed");

    assert_eq!(report.loaded.len(), 1);
    assert_eq!(report.table.height(), 3);
}

#[test]
fn one_bad_file_aborts_the_whole_batch() {
    let request = LoadRequest::new(fixture_dir("broken"), SourceFormat::Generic);
    let err = load(&request, &LoadOptions::default()).unwrap_err();

    match &err {
        LoadError::AggregationAbort { path, .. } => {
            assert!(path.ends_with("b_no_dates.csv"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(err.root(), LoadError::HeaderDetection { .. }));
}

#[test]
fn missing_directory_is_an_io_error() {
    let request = LoadRequest::new(fixture_dir("no_such_dir"), SourceFormat::Generic);
    let err = load(&request, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn aggregate_exports_to_dataframe() {
    let request = LoadRequest::new(fixture_dir("outer_join"), SourceFormat::Generic);
    let report = load(&request, &LoadOptions::default()).expect("aggregate load failed");
    let df = report.table.to_dataframe().expect("dataframe");

    let names: Vec<&str> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();
    assert_eq!(names, vec!["timestamp", "POA", "GHI", "Wind", "index"]);
    assert_eq!(df.column("Wind").expect("Wind").null_count(), 2);
}
