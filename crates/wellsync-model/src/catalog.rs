//! Built-in sync profile for the planning warehouse and the Aries ledger.

use crate::profile::{DerivedColumn, FieldCheck, ScalarKind, SyncProfile};
use crate::target::{CompareOp, FilterPredicate, PredicateSource, SqlType, TargetTable};

/// Business unit that keeps the pre-spud id in `USER3` instead of
/// `PRESPUDWELLID`, so other tools do not sync it.
pub const USER3_PSID_BUSINESS_UNIT: &str = "SOUTH TEXAS";

/// Precision used for every latitude/longitude comparison.
pub const COORDINATE_PRECISION: i32 = 4;

/// Ledger `AC_USER.TEXT16` value marking a reserves case; lateral lengths of
/// reserves cases are never overwritten.
pub const RESERVES_CASE: &str = "RESERVES CASE";

const KEY_TYPE: SqlType = SqlType::VarChar(255);

impl SyncProfile {
    /// The standard profile for one business unit.
    pub fn builtin(business_unit: &str) -> Self {
        let business_unit = business_unit.trim().to_uppercase();
        let psid_column = if business_unit == USER3_PSID_BUSINESS_UNIT {
            "USER3"
        } else {
            "PRESPUDWELLID"
        };

        let property = TargetTable::PropertyBase;
        let budget = TargetTable::BudgetBase;
        let coordinate = |name: &str, planning: &str, ledger: &str, target: TargetTable| {
            FieldCheck::numeric(name, planning, ledger, COORDINATE_PRECISION)
                .updates(target, SqlType::Float)
        };

        let checks = vec![
            FieldCheck::numeric("PSID", "PSID", "PSID_AR", 0)
                .updates(property, SqlType::VarChar(255))
                .setting(psid_column),
            FieldCheck::text("PROP_NUM", "PROP_NUM_DP", "PROP_NUM_AR")
                .updates(property, SqlType::VarChar(10))
                .setting("PROP_NUM"),
            FieldCheck::text("LEASE", "WELL_NAME", "LEASE").updates(property, SqlType::VarChar(36)),
            FieldCheck::text("PAD_NAME", "PAD_NAME_DP", "PAD_NAME_AR")
                .updates(property, SqlType::VarChar(36))
                .setting("PAD_NAME"),
            FieldCheck::text("PROJECT_NAME", "PROJECT_NAME_DP", "PROJECT_NAME_AR")
                .updates(budget, SqlType::VarChar(75))
                .setting("PROJECT_NAME"),
            FieldCheck::text("MDA", "MKT_DEDICATION_AREA", "MDA"),
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
            coordinate("SH_LAT", "SL_LAT", "LAT_SURFACE", property),
            coordinate("SH_LONG", "SL_LONG", "LONG_SURFACE", property),
            coordinate("TH_LAT", "TP_LAT", "LAT_TARGET", property),
            coordinate("TH_LONG", "TP_LONG", "LONG_TARGET", property),
            coordinate("BH_LAT", "BHL_LAT", "LAT_BH", property),
            coordinate("BH_LONG", "BHL_LONG", "LONG_BH", property),
            coordinate("PLANNED_SH_LAT", "SL_LAT", "PLANNED_SH_LAT", budget),
            coordinate("PLANNED_SH_LONG", "SL_LONG", "PLANNED_SH_LONG", budget),
            coordinate("PLANNED_TARGET_LAT", "TP_LAT", "PLANNED_TARGET_LAT", budget),
            coordinate("PLANNED_TARGET_LONG", "TP_LONG", "PLANNED_TARGET_LONG", budget),
            coordinate("PLANNED_BH_LAT", "BHL_LAT", "PLANNED_BH_LAT", budget),
            coordinate("PLANNED_BH_LONG", "BHL_LONG", "PLANNED_BH_LONG", budget),
        ];

        Self {
            business_unit,
            planning_key: "ARIES_ID".to_string(),
            ledger_key: "ARIES_CODE".to_string(),
            lease_column: "LEASE".to_string(),
            planning_suffix: "_DP".to_string(),
            ledger_suffix: "_AR".to_string(),
            key_type: KEY_TYPE,
            planning_orphan_columns: strings(&[
                "ARIES_CODE",
                "ARIES_ID",
                "WELL_NAME",
                "LEASE",
                "RSV_CAT_DP",
                "RSV_CAT_AR",
            ]),
            ledger_orphan_columns: strings(&[
                "ARIES_CODE",
                "ARIES_ID",
                "WELL_NAME",
                "LEASE",
                "RSV_CAT_DP",
                "RSV_CAT_AR",
                "TD_DATE",
            ]),
            derived: vec![
                DerivedColumn::new("PSID_AR", "USER3", "PRESPUDWELLID", ScalarKind::Integer),
                // First waypoint when surveyed, otherwise the landing point.
                DerivedColumn::new("TP_LAT", "WAYPOINT1_LAT", "LP_LAT", ScalarKind::Float),
                DerivedColumn::new("TP_LONG", "WAYPOINT1_LONG", "LP_LONG", ScalarKind::Float),
            ],
            checks,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
