//! Tests for CSV extracts and source filters.

use std::fs;

use polars::prelude::{DataType, NamedFrom, Series};
use tempfile::TempDir;
use wellsync_ingest::{
    LedgerFilter, PlanningFilter, read_frame, read_ledger_dir, write_frame,
    write_ledger_dir,
};

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn every_column_is_read_as_text() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "planning.csv", "ARIES_ID,PROP_NUM,SL_LAT\nA1,000123,28.5\nA2,,\n");
    let df = read_frame(&path).unwrap();
    assert_eq!(df.height(), 2);
    for column in df.get_columns() {
        assert_eq!(column.dtype(), &DataType::String);
    }
    let prop_num = df.column("PROP_NUM").unwrap();
    assert_eq!(prop_num.get(0).unwrap().str_value(), "000123");
    assert!(prop_num.get(1).unwrap().is_null());
}

#[test]
fn frames_survive_a_write_and_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("out.csv");
    let mut df = polars::prelude::DataFrame::new(vec![
        Series::new("ARIES_CODE".into(), vec![Some("A1"), None]).into(),
    ])
    .unwrap();
    df.with_column(Series::new("LAT".into(), vec![Some(28.5), Some(-97.25)]))
        .unwrap();
    write_frame(&path, &df).unwrap();
    let back = read_frame(&path).unwrap();
    assert_eq!(back.shape(), (2, 2));
    assert_eq!(back.column("LAT").unwrap().get(1).unwrap().str_value(), "-97.25");
}

#[test]
fn ledger_dir_without_user_table() {
    let dir = TempDir::new().unwrap();
    write(&dir, "AC_PROPERTY.csv", "PROPNUM,ARIES_CODE\nP1,A1\n");
    write(&dir, "AC_BUDGET.csv", "PROPNUM,PLANNED_LL\nP1,10560\n");
    let tables = read_ledger_dir(dir.path()).unwrap();
    assert!(tables.user.is_none());

    let out = TempDir::new().unwrap();
    write_ledger_dir(out.path(), &tables).unwrap();
    assert!(out.path().join("AC_PROPERTY.csv").is_file());
    assert!(!out.path().join("AC_USER.csv").exists());
}

#[test]
fn missing_ledger_table_is_an_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, "AC_PROPERTY.csv", "PROPNUM,ARIES_CODE\nP1,A1\n");
    let err = read_ledger_dir(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("AC_BUDGET.csv"));
}

#[test]
fn planning_filter_keeps_active_rows() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "planning.csv",
        "ARIES_ID,BUSINESS_UNIT,SCENARIO,DEV_STATUS\n\
         A1,SOUTH TEXAS,A,PRIMARY\n\
         A2,South Texas,MDV,DEVELOPMENT\n\
         A3,SOUTH TEXAS,B,PRIMARY\n\
         A4,SOUTH TEXAS,A,DRILLED\n\
         A5,BRAZOS VALLEY,A,PRIMARY\n\
         A6,,A,PRIMARY\n",
    );
    let df = read_frame(&path).unwrap();
    let filtered = PlanningFilter::new("south texas").apply(&df).unwrap();
    assert_eq!(filtered.height(), 2);
}

#[test]
fn ledger_filter_keeps_undeveloped_categories() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "ledger.csv",
        "ARIES_CODE,BUSINESS_UNIT,RSV_CAT\n\
         A1,SOUTH TEXAS,5PUD\n\
         A2,SOUTH TEXAS,1PDP\n\
         A3,SOUTH TEXAS,7POSS\n\
         A4,BRAZOS VALLEY,5PUD\n",
    );
    let df = read_frame(&path).unwrap();
    let filtered = LedgerFilter::new("SOUTH TEXAS").apply(&df).unwrap();
    assert_eq!(filtered.height(), 2);
}

#[test]
fn filter_without_its_column_fails() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "ledger.csv", "ARIES_CODE,BUSINESS_UNIT\nA1,SOUTH TEXAS\n");
    let df = read_frame(&path).unwrap();
    assert!(LedgerFilter::new("SOUTH TEXAS").apply(&df).is_err());
}
