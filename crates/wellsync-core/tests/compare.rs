//! Comparator behavior on small hand-built joined datasets.

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use wellsync_core::{
    DELTA_COLUMN, DiffLayout, MATCH_COLUMN, compare_columns, compare_numeric_columns,
};
use wellsync_model::{MatchClass, MatchLabels};

fn text_column(name: &str, values: &[Option<&str>]) -> Column {
    Series::new(name.into(), values.to_vec()).into_column()
}

fn labels_of(df: &DataFrame) -> Vec<String> {
    df.column(MATCH_COLUMN)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|label| label.unwrap_or_default().to_string())
        .collect()
}

fn codes(n: usize) -> Vec<Option<String>> {
    (1..=n).map(|i| Some(format!("TEST{i:03}"))).collect()
}

fn leases(n: usize) -> Vec<Option<String>> {
    (1..=n).map(|i| Some(format!("WELL{i}"))).collect()
}

#[test]
fn textual_comparison_covers_every_class() {
    let df = DataFrame::new(vec![
        Series::new("ARIES_CODE".into(), codes(5)).into_column(),
        Series::new("LEASE".into(), leases(5)).into_column(),
        text_column(
            "DP_COL",
            &[Some("ImEqual"), Some("NotEqualSameType"), Some("NotNull"), None, None],
        ),
        text_column(
            "AR_COL",
            &[Some("ImEqual"), Some("SameTypeNotEqual"), None, Some("NotNull"), None],
        ),
    ])
    .unwrap();
    let labels = MatchLabels::new("msg1", "msg2", "msg3", "msg4", "msg5");

    let diff = compare_columns("DP_COL", "AR_COL", &df, &labels, &DiffLayout::default()).unwrap();

    assert_eq!(labels_of(&diff.data), vec!["msg1", "msg2", "msg3", "msg4", "msg5"]);
    assert_eq!(diff.classes, MatchClass::ALL.to_vec());
    let names: Vec<String> = diff
        .data
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["ARIES_CODE", "LEASE", "DP_COL", "AR_COL", "MATCH"]);
}

fn numeric_frame() -> DataFrame {
    DataFrame::new(vec![
        Series::new("ARIES_CODE".into(), codes(10)).into_column(),
        Series::new("LEASE".into(), leases(10)).into_column(),
        text_column(
            "DP_COL",
            &[
                Some("5.12345678"),
                Some("-90.4682467"),
                Some("7.98765432"),
                Some("-32.123456789"),
                Some("1.0000"),
                Some("1.0000"),
                None,
                Some("NaN"),
                None,
                Some("NaN"),
            ],
        ),
        text_column(
            "AR_COL",
            &[
                Some("5.12345678"),
                Some("-90.4682467"),
                Some("7.98123456"),
                Some("-30.98756263"),
                None,
                Some("NaN"),
                Some("1.0000"),
                Some("1.0000"),
                None,
                Some("NaN"),
            ],
        ),
    ])
    .unwrap()
}

#[test]
fn numeric_comparison_at_whole_units() {
    let diff = compare_numeric_columns(
        "DP_COL",
        "AR_COL",
        &numeric_frame(),
        0,
        &MatchLabels::numeric(),
        &DiffLayout::default(),
    )
    .unwrap();
    assert_eq!(
        labels_of(&diff.data),
        vec![
            "MATCH",
            "MATCH",
            "MATCH",
            "UPDATE ARIES",
            "UPDATE ARIES",
            "UPDATE ARIES",
            "DP EMPTY",
            "DP EMPTY",
            "BOTH VALUES NULL",
            "BOTH VALUES NULL",
        ]
    );
    assert_eq!(diff.pending_updates(), 3);
}

#[test]
fn numeric_comparison_at_six_digits() {
    let diff = compare_numeric_columns(
        "DP_COL",
        "AR_COL",
        &numeric_frame(),
        6,
        &MatchLabels::numeric(),
        &DiffLayout::default(),
    )
    .unwrap();
    assert_eq!(
        labels_of(&diff.data),
        vec![
            "MATCH",
            "MATCH",
            "UPDATE ARIES",
            "UPDATE ARIES",
            "UPDATE ARIES",
            "UPDATE ARIES",
            "DP EMPTY",
            "DP EMPTY",
            "BOTH VALUES NULL",
            "BOTH VALUES NULL",
        ]
    );
}

#[test]
fn numeric_output_replaces_values_with_floats() {
    let diff = compare_numeric_columns(
        "DP_COL",
        "AR_COL",
        &numeric_frame(),
        0,
        &MatchLabels::numeric(),
        &DiffLayout::default(),
    )
    .unwrap();
    let planning: Vec<Option<f64>> = diff
        .data
        .column("DP_COL")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(planning[0], Some(5.123_456_78));
    assert_eq!(planning[7], None);

    let deltas: Vec<Option<f64>> = diff
        .data
        .column(DELTA_COLUMN)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(deltas[3], Some(-1.0));
    assert_eq!(deltas[4], None);
}

#[test]
fn zero_planning_value_is_reported_as_empty() {
    let df = DataFrame::new(vec![
        Series::new("ARIES_CODE".into(), codes(2)).into_column(),
        Series::new("LEASE".into(), leases(2)).into_column(),
        text_column("DP_COL", &[Some("0"), Some("0.0")]),
        text_column("AR_COL", &[Some("10560"), Some("0")]),
    ])
    .unwrap();
    let diff = compare_numeric_columns(
        "DP_COL",
        "AR_COL",
        &df,
        0,
        &MatchLabels::numeric(),
        &DiffLayout::default(),
    )
    .unwrap();
    assert_eq!(
        diff.classes,
        vec![MatchClass::PlanningMissing, MatchClass::BothMissing]
    );
    assert_eq!(diff.pending_updates(), 0);
}
