use scave_results::ResultsError;
use scave_results::ingestion::{
    MetadataLayout, read_metadata_tsv, read_results_csv, read_results_csv_from_path, read_results_csv_from_reader,
};
use scave_results::model::{ResultKind, ResultPayload};
use scave_results::types::{DataType, Value};

#[test]
fn read_results_csv_from_path_happy_path() {
    let t = read_results_csv_from_path("tests/fixtures/histograms.csv").unwrap();

    assert_eq!(t.row_count(), 3);
    assert_eq!(t.schema.fields[0].name, "runID");
    assert_eq!(t.value(0, "count"), Some(&Value::Int64(12)));
    assert_eq!(t.value(0, "stddev"), Some(&Value::Float64(0.5)));
    assert_eq!(t.value(1, "attrvalue"), Some(&Value::Utf8("collision multiplicity, histogram".into())));
    // attr rows are not histograms, so their absent arrays stay missing
    assert_eq!(t.value(1, "binedges"), Some(&Value::Null));
    assert_eq!(t.value(2, "binvalues"), Some(&Value::FloatArray(vec![])));
}

#[test]
fn columns_are_typed_by_name() {
    let t = read_results_csv_from_path("tests/fixtures/mixed.csv").unwrap();
    let dtype = |name: &str| t.schema.fields[t.index_of(name).unwrap()].data_type;

    assert_eq!(dtype("count"), DataType::Int64);
    assert_eq!(dtype("mean"), DataType::Float64);
    assert_eq!(dtype("vecvalue"), DataType::FloatArray);
    assert_eq!(dtype("module"), DataType::Utf8);
    assert_eq!(dtype("value"), DataType::Generic);
}

#[test]
fn read_results_csv_allows_reordered_and_unknown_columns() {
    let input = "value,name,type,run,experiment\n1.5,delay,scalar,Run-0,E1\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let t = read_results_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(t.value(0, "value"), Some(&Value::Float64(1.5)));
    assert_eq!(t.value(0, "runID"), Some(&Value::Utf8("Run-0".into())));
    assert_eq!(t.value(0, "experiment"), Some(&Value::Utf8("E1".into())));
}

#[test]
fn parse_error_names_row_and_column() {
    let input = "run,type,module,name,mean\nRun-0,statistic,Net.a,s,1.0\nRun-0,statistic,Net.a,t,abc\n";

    let err = read_results_csv(input.as_bytes()).unwrap_err();
    match err {
        ResultsError::ParseError { row, column, raw, .. } => {
            assert_eq!(row, 3);
            assert_eq!(column, "mean");
            assert_eq!(raw, "abc");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_numeric_scalar_value_is_rejected() {
    let input = "run,type,module,name,value\nRun-0,scalar,Net.a,s,fast\n";
    let err = read_results_csv(input.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("column 'value'"));
}

#[test]
fn empty_stream_yields_empty_table() {
    let t = read_results_csv(b"").unwrap();
    assert!(t.is_empty());
    assert_eq!(t.column_count(), 0);
}

#[test]
fn mixed_stream_projects_to_result_items() {
    let t = read_results_csv_from_path("tests/fixtures/mixed.csv").unwrap();

    let items = t.result_items().unwrap();
    let kinds: Vec<ResultKind> = items.iter().map(|i| i.payload.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ResultKind::RunAttr,
            ResultKind::Scalar,
            ResultKind::Vector,
            ResultKind::Histogram,
            ResultKind::Statistic
        ]
    );

    let vectors = t.items_of_kind(ResultKind::Vector).unwrap();
    assert_eq!(vectors.len(), 1);
    match &vectors[0].payload {
        ResultPayload::Vector { vectime, vecvalue } => {
            assert_eq!(vectime, &vec![0.0, 1.0]);
            assert_eq!(vecvalue, &vec![0.0, 1.0]);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn metadata_fixture_parses_as_opaque_text() {
    let bytes = std::fs::read("tests/fixtures/config.tsv").unwrap();
    let t = read_metadata_tsv(&bytes, MetadataLayout::NameValue).unwrap();

    assert_eq!(t.row_count(), 3);
    assert_eq!(t.value(1, "value"), Some(&Value::Utf8("uniform(0m, 1000m)".into())));

    let rows = t.metadata_rows().unwrap();
    assert_eq!(rows[0].name.as_deref(), Some("sim-time-limit"));
    assert_eq!(rows[0].value.as_deref(), Some("90min"));
}

#[test]
fn run_list_fixture_has_single_column() {
    let bytes = std::fs::read("tests/fixtures/runs.tsv").unwrap();
    let t = read_metadata_tsv(&bytes, MetadataLayout::Runs).unwrap();

    assert_eq!(t.schema.field_names().collect::<Vec<_>>(), vec!["runID"]);
    assert_eq!(t.row_count(), 2);
}
