//! End-to-end runs against the in-memory ledger.

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use wellsync_core::{
    LedgerStore, MemoryLedger, ReconcileSession, SkipReason, SqlScript, StagedTable,
    StoreError, TypeHints, left_join,
};
use wellsync_model::catalog::RESERVES_CASE;
use wellsync_model::{
    CompareOp, FieldCheck, FilterPredicate, MatchClass, MatchLabels, PredicateSource, SqlType,
    SyncProfile, TargetTable,
};

fn text_column(name: &str, values: &[Option<&str>]) -> Column {
    Series::new(name.into(), values.to_vec()).into_column()
}

fn frame(columns: Vec<Column>) -> DataFrame {
    DataFrame::new(columns).unwrap()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn profile() -> SyncProfile {
    let property = TargetTable::PropertyBase;
    let budget = TargetTable::BudgetBase;
    SyncProfile {
        business_unit: "SOUTH TEXAS".to_string(),
        planning_key: "ARIES_ID".to_string(),
        ledger_key: "ARIES_CODE".to_string(),
        lease_column: "LEASE".to_string(),
        planning_suffix: "_DP".to_string(),
        ledger_suffix: "_AR".to_string(),
        key_type: SqlType::VarChar(255),
        planning_orphan_columns: strings(&["ARIES_ID", "WELL_NAME"]),
        ledger_orphan_columns: strings(&["ARIES_CODE", "LEASE"]),
        derived: Vec::new(),
        checks: vec![
            FieldCheck::text("LEASE", "WELL_NAME", "LEASE").updates(property, SqlType::VarChar(36)),
            FieldCheck::text("PAD_NAME", "PAD_NAME_DP", "PAD_NAME_AR")
                .updates(property, SqlType::VarChar(36))
                .setting("PAD_NAME"),
            FieldCheck::numeric("LATERAL_LEN", "COMPLETABLE_LL", "LATERAL_LEN", 0)
                .updates(property, SqlType::Integer)
                .when(FilterPredicate::new(
                    PredicateSource::User,
                    "TEXT16",
                    CompareOp::NotEq,
                    RESERVES_CASE,
                )),
            FieldCheck::numeric("PLANNED_LL", "COMPLETABLE_LL", "PLANNED_LL", 0)
                .updates(budget, SqlType::Integer),
            FieldCheck::numeric("SH_LAT", "SL_LAT", "LAT_SURFACE", 4)
                .updates(property, SqlType::Float),
            FieldCheck::text("MDA", "MKT_DEDICATION_AREA", "MDA"),
        ],
    }
}

fn planning() -> DataFrame {
    frame(vec![
        text_column("ARIES_ID", &[Some("A1"), Some("A2"), Some("A3"), Some("A9")]),
        text_column(
            "WELL_NAME",
            &[Some("Well 1"), Some("Well 2 NEW"), Some("Well 3"), Some("Orphan plan")],
        ),
        text_column("PAD_NAME", &[Some("PAD A"), Some("PAD B"), None, Some("PAD Z")]),
        text_column("COMPLETABLE_LL", &[Some("10560"), Some("7500"), Some("9000"), Some("1")]),
        text_column("SL_LAT", &[Some("28.12345"), Some("28.5"), Some("28.7"), Some("1")]),
        text_column("MKT_DEDICATION_AREA", &[Some("NORTH"), Some("NORTH"), None, None]),
    ])
}

fn ledger() -> MemoryLedger {
    let property = frame(vec![
        text_column("PROPNUM", &[Some("P1"), Some("P2"), Some("P3"), Some("P4")]),
        text_column("ARIES_CODE", &[Some("A1"), Some("A2"), Some("A3"), Some("A8")]),
        text_column(
            "LEASE",
            &[Some("Well 1"), Some("Well 2"), Some("Well 3"), Some("Orphan ledger")],
        ),
        text_column("PAD_NAME", &[Some("PAD A"), None, Some("PAD C"), None]),
        text_column("LATERAL_LEN", &[Some("10560"), None, Some("8000"), None]),
        text_column("LAT_SURFACE", &[Some("28.12345"), Some("28.4"), None, None]),
        text_column("MDA", &[Some("NORTH"), Some("SOUTH"), None, None]),
    ]);
    let budget = frame(vec![
        text_column("PROPNUM", &[Some("P1"), Some("P2"), Some("P3"), Some("P4")]),
        text_column("PLANNED_LL", &[Some("10560"), Some("7000"), None, Some("100")]),
    ]);
    let user = frame(vec![
        text_column("PROPNUM", &[Some("P1"), Some("P2"), Some("P3"), Some("P4")]),
        text_column(
            "TEXT16",
            &[Some("DEVELOPMENT"), Some("DEVELOPMENT"), Some(RESERVES_CASE), None],
        ),
    ]);
    MemoryLedger::new(property, budget).with_user_table(user)
}

fn cell(df: &DataFrame, column: &str, row: usize) -> Option<String> {
    let value = df.column(column).unwrap().get(row).unwrap();
    if value.is_null() {
        None
    } else {
        Some(value.str_value().to_string())
    }
}

#[test]
fn run_reports_orphans_and_pending_updates() {
    let session = ReconcileSession::new(profile()).unwrap();
    let store = ledger();
    let run = session.run(&planning(), &store.ledger_view().unwrap()).unwrap();

    assert_eq!(run.joined.working.height(), 3);
    assert_eq!(run.joined.in_planning_not_ledger.height(), 1);
    assert_eq!(run.joined.in_ledger_not_planning.height(), 1);
    assert_eq!(cell(&run.joined.in_planning_not_ledger, "ARIES_ID", 0).as_deref(), Some("A9"));

    let pending: Vec<(&str, usize)> = run
        .diffs
        .iter()
        .map(|diff| (diff.name.as_str(), diff.pending_updates()))
        .collect();
    assert_eq!(
        pending,
        vec![
            ("LEASE", 1),
            ("PAD_NAME", 1),
            ("LATERAL_LEN", 2),
            ("PLANNED_LL", 2),
            ("SH_LAT", 2),
            ("MDA", 1),
        ]
    );
}

#[test]
fn updates_are_scoped_and_idempotent() {
    let session = ReconcileSession::new(profile()).unwrap();
    let mut store = ledger();
    let run = session.run(&planning(), &store.ledger_view().unwrap()).unwrap();

    let report = session.apply_updates(&run, &mut store).unwrap();
    let affected: Vec<(&str, Option<usize>)> = report
        .applied
        .iter()
        .map(|applied| (applied.check.as_str(), applied.outcome.rows_affected))
        .collect();
    assert_eq!(
        affected,
        vec![
            ("LEASE", Some(1)),
            ("PAD_NAME", Some(1)),
            ("LATERAL_LEN", Some(1)),
            ("PLANNED_LL", Some(2)),
            ("SH_LAT", Some(2)),
        ]
    );
    assert_eq!(report.skipped, vec![("MDA".to_string(), SkipReason::ReportOnly)]);

    let property = store.table(TargetTable::PropertyBase).clone();
    assert_eq!(cell(&property, "LEASE", 1).as_deref(), Some("Well 2 NEW"));
    assert_eq!(cell(&property, "PAD_NAME", 1).as_deref(), Some("PAD B"));
    assert_eq!(cell(&property, "PAD_NAME", 2).as_deref(), Some("PAD C"));
    assert_eq!(cell(&property, "LATERAL_LEN", 1).as_deref(), Some("7500"));
    // Reserves cases keep their lateral length.
    assert_eq!(cell(&property, "LATERAL_LEN", 2).as_deref(), Some("8000"));
    assert_eq!(cell(&property, "LAT_SURFACE", 1).as_deref(), Some("28.5"));
    assert_eq!(cell(&property, "LEASE", 3).as_deref(), Some("Orphan ledger"));
    let budget = store.table(TargetTable::BudgetBase).clone();
    assert_eq!(cell(&budget, "PLANNED_LL", 1).as_deref(), Some("7500"));
    assert_eq!(cell(&budget, "PLANNED_LL", 2).as_deref(), Some("9000"));
    assert_eq!(cell(&budget, "PLANNED_LL", 3).as_deref(), Some("100"));

    let rerun = session.run(&planning(), &store.ledger_view().unwrap()).unwrap();
    assert_eq!(rerun.pending_updates(), 2);
    assert_eq!(rerun.diff("LATERAL_LEN").unwrap().pending_updates(), 1);

    let second = session.apply_updates(&rerun, &mut store).unwrap();
    assert_eq!(second.applied.len(), 1);
    assert_eq!(second.applied[0].outcome.rows_affected, Some(0));
    assert!(store.table(TargetTable::PropertyBase).equals_missing(&property));
    assert!(store.table(TargetTable::BudgetBase).equals_missing(&budget));
}

#[test]
fn script_store_records_statements() {
    let session = ReconcileSession::new(profile()).unwrap();
    let store = ledger();
    let run = session.run(&planning(), &store.ledger_view().unwrap()).unwrap();

    let mut script = SqlScript::default();
    let report = session.apply_updates(&run, &mut script).unwrap();
    assert_eq!(report.applied.len(), 5);
    assert!(report.applied.iter().all(|applied| applied.outcome.rows_affected.is_none()));
    assert_eq!(script.statements().len(), 10);

    let updates: Vec<&String> = script
        .statements()
        .iter()
        .filter(|sql| sql.starts_with("UPDATE"))
        .collect();
    assert_eq!(updates.len(), 5);
    let with_user: Vec<&&String> = updates.iter().filter(|sql| sql.contains("AC_USER")).collect();
    assert_eq!(with_user.len(), 1);
    assert!(with_user[0].contains("[LATERAL_LEN]"));
    assert!(script.to_script().contains("GO"));
}

#[test]
fn staging_rejects_values_too_long_for_the_column() {
    let mut store = ledger();
    let mut hints = TypeHints::new();
    hints.insert("WELL_NAME".to_string(), SqlType::VarChar(4));
    let table = StagedTable {
        name: "#check_test".to_string(),
        hints,
        data: frame(vec![text_column("WELL_NAME", &[Some("Well 2 NEW")])]),
    };
    let err = store.stage(&table).unwrap_err();
    assert!(matches!(err, StoreError::Staging { .. }));
}

#[test]
fn staging_rejects_non_numeric_floats() {
    let mut store = ledger();
    let mut hints = TypeHints::new();
    hints.insert("SL_LAT".to_string(), SqlType::Float);
    let table = StagedTable {
        name: "#check_test".to_string(),
        hints,
        data: frame(vec![text_column("SL_LAT", &[Some("north"), None])]),
    };
    assert!(store.stage(&table).is_err());
}

#[test]
fn duplicate_right_keys_multiply_rows() {
    let left = frame(vec![text_column("ID", &[Some("A1"), Some("A2")])]);
    let right = frame(vec![
        text_column("CODE", &[Some("A1"), Some("A1"), Some("A2")]),
        text_column("V", &[Some("x"), Some("y"), Some("z")]),
    ]);
    let joined = left_join(&left, &right, "ID", "CODE", "_L", "_R").unwrap();
    assert_eq!(joined.frame.height(), 3);

    let unique = frame(vec![
        text_column("CODE", &[Some("A1"), Some("A2")]),
        text_column("V", &[Some("x"), Some("z")]),
    ]);
    let joined = left_join(&left, &unique, "ID", "CODE", "_L", "_R").unwrap();
    assert_eq!(joined.frame.height(), left.height());
}

/// One PAD_NAME check whose update label is shared by every class except
/// match and both-missing.
fn pad_name_only() -> SyncProfile {
    let mut profile = profile();
    profile.checks = vec![
        FieldCheck::text("PAD_NAME", "PAD_NAME_DP", "PAD_NAME_AR")
            .updates(TargetTable::PropertyBase, SqlType::VarChar(36))
            .setting("PAD_NAME")
            .with_labels(MatchLabels::new("OK", "FIX", "FIX", "FIX", "NONE")),
    ];
    profile
}

fn pad_name_sources(
    planning_keys: &[Option<&str>],
    planning_pads: &[Option<&str>],
    ledger_keys: &[Option<&str>],
    ledger_pads: &[Option<&str>],
) -> (DataFrame, MemoryLedger) {
    let names: Vec<Option<&str>> = planning_keys.iter().map(|_| Some("Well")).collect();
    let planning = frame(vec![
        text_column("ARIES_ID", planning_keys),
        text_column("WELL_NAME", &names),
        text_column("PAD_NAME", planning_pads),
    ]);
    let numbers: Vec<String> = (1..=ledger_keys.len()).map(|n| format!("P{n}")).collect();
    let numbers: Vec<Option<&str>> = numbers.iter().map(|n| Some(n.as_str())).collect();
    let leases: Vec<Option<&str>> = ledger_keys.iter().map(|_| Some("Lease")).collect();
    let property = frame(vec![
        text_column("PROPNUM", &numbers),
        text_column("ARIES_CODE", ledger_keys),
        text_column("LEASE", &leases),
        text_column("PAD_NAME", ledger_pads),
    ]);
    let budget = frame(vec![text_column("PROPNUM", &numbers)]);
    (planning, MemoryLedger::new(property, budget))
}

#[test]
fn shared_labels_do_not_widen_the_update() {
    let session = ReconcileSession::new(pad_name_only()).unwrap();
    let (planning, mut store) = pad_name_sources(
        &[Some("A1"), Some("A2")],
        &[Some("NEW"), None],
        &[Some("A1"), Some("A2")],
        &[Some("OLD"), Some("KEEP ME")],
    );
    let run = session.run(&planning, &store.ledger_view().unwrap()).unwrap();
    let diff = run.diff("PAD_NAME").unwrap();
    assert_eq!(diff.classes, vec![MatchClass::Mismatch, MatchClass::PlanningMissing]);
    assert_eq!(diff.label_counts()["FIX"], 2);
    assert_eq!(diff.pending_updates(), 1);

    let report = session.apply_updates(&run, &mut store).unwrap();
    assert_eq!(report.applied[0].outcome.rows_affected, Some(1));
    let property = store.table(TargetTable::PropertyBase);
    assert_eq!(cell(property, "PAD_NAME", 0).as_deref(), Some("NEW"));
    assert_eq!(cell(property, "PAD_NAME", 1).as_deref(), Some("KEEP ME"));

    let mut script = SqlScript::default();
    session.apply_updates(&run, &mut script).unwrap();
    let update = &script.statements()[1];
    assert!(update.contains("ct.[MATCH_CLASS] IN ('mismatch', 'ledger_missing')"));
    assert!(!update.contains("'FIX'"));
}

#[test]
fn null_keys_are_orphans_on_both_sides() {
    let session = ReconcileSession::new(pad_name_only()).unwrap();
    let (planning, store) = pad_name_sources(
        &[Some("A1"), None],
        &[Some("PAD A"), Some("PAD N")],
        &[Some("A1"), None],
        &[Some("PAD A"), Some("PAD M")],
    );
    let run = session.run(&planning, &store.ledger_view().unwrap()).unwrap();

    let working = &run.joined.working;
    assert_eq!(working.height(), 1);
    assert_eq!(cell(working, "ARIES_CODE", 0).as_deref(), Some("A1"));
    assert_eq!(cell(working, "ARIES_ID", 0).as_deref(), Some("A1"));

    let planning_orphans = &run.joined.in_planning_not_ledger;
    assert_eq!(planning_orphans.height(), 1);
    assert_eq!(cell(planning_orphans, "ARIES_ID", 0), None);

    let ledger_orphans = &run.joined.in_ledger_not_planning;
    assert_eq!(ledger_orphans.height(), 1);
    assert_eq!(cell(ledger_orphans, "ARIES_CODE", 0), None);
    assert_eq!(cell(ledger_orphans, "LEASE", 0).as_deref(), Some("Lease"));

    assert_eq!(run.diff("PAD_NAME").unwrap().classes, vec![MatchClass::Match]);
}

#[test]
fn staging_rejects_infinite_floats() {
    let mut store = ledger();
    let mut hints = TypeHints::new();
    hints.insert("SL_LAT".to_string(), SqlType::Float);
    let table = StagedTable {
        name: "#check_test".to_string(),
        hints,
        data: frame(vec![text_column("SL_LAT", &[Some("28.5"), Some("inf")])]),
    };
    assert!(matches!(store.stage(&table).unwrap_err(), StoreError::Staging { .. }));
}
