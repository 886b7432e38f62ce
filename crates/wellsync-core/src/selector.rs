//! First-present value selection.
//!
//! Used to build derived columns such as the ledger pre-spud id, which lives
//! in one of two ledger fields depending on the business unit.

use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::debug;
use wellsync_common::{FieldValue, column_values, has_column};
use wellsync_model::{DerivedColumn, ScalarKind};

use crate::error::{ReconcileError, Result};

/// Lenient conversion of a cell into a target scalar type.
///
/// A value that does not convert is treated the same as an absent one.
pub trait Coerce: Sized + Default {
    fn coerce(value: &FieldValue) -> Option<Self>;
}

impl Coerce for i64 {
    fn coerce(value: &FieldValue) -> Option<Self> {
        value.as_i64()
    }
}

impl Coerce for f64 {
    fn coerce(value: &FieldValue) -> Option<Self> {
        value.as_f64()
    }
}

impl Coerce for String {
    fn coerce(value: &FieldValue) -> Option<Self> {
        value.as_text()
    }
}

/// Returns the primary value if present and convertible, else the secondary
/// one, else the type's zero value.
///
/// ```
/// use wellsync_common::FieldValue;
/// use wellsync_core::select_first;
///
/// let psid: i64 = select_first(&FieldValue::Null, &FieldValue::from("43720"));
/// assert_eq!(psid, 43720);
/// ```
pub fn select_first<T: Coerce>(primary: &FieldValue, secondary: &FieldValue) -> T {
    [primary, secondary]
        .into_iter()
        .filter(|value| !value.is_null())
        .find_map(T::coerce)
        .unwrap_or_default()
}

/// Computes one derived column over every row of `df`.
pub fn derive_column(df: &DataFrame, derived: &DerivedColumn) -> Result<Series> {
    for column in [&derived.primary, &derived.secondary] {
        if !has_column(df, column) {
            return Err(ReconcileError::missing_column("joined", column.as_str()));
        }
    }
    let primary = column_values(df, &derived.primary)?;
    let secondary = column_values(df, &derived.secondary)?;
    let pairs = primary.iter().zip(&secondary);
    let name = derived.name.as_str().into();

    let series = match derived.kind {
        ScalarKind::Integer => {
            let data: Vec<i64> = pairs.map(|(p, s)| select_first(p, s)).collect();
            Series::new(name, data)
        }
        ScalarKind::Float => {
            let data: Vec<f64> = pairs.map(|(p, s)| select_first(p, s)).collect();
            Series::new(name, data)
        }
        ScalarKind::Text => {
            let data: Vec<String> = pairs.map(|(p, s)| select_first(p, s)).collect();
            Series::new(name, data)
        }
    };
    Ok(series)
}

/// Adds every derived column whose inputs are present.
///
/// Derived columns with missing inputs are skipped; a check that compares
/// against one then fails with a missing-column error of its own.
pub fn with_derived_columns(mut df: DataFrame, derived: &[DerivedColumn]) -> Result<DataFrame> {
    for column in derived {
        match derive_column(&df, column) {
            Ok(series) => {
                df.with_column(series)?;
            }
            Err(ReconcileError::MissingColumn { column: missing, .. }) => {
                debug!(derived = %column.name, missing = %missing, "skipping derived column");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(value: &str) -> FieldValue {
        FieldValue::from(value)
    }

    #[test]
    fn both_missing_yields_zero() {
        let value: i64 = select_first(&FieldValue::Null, &FieldValue::Null);
        assert_eq!(value, 0);
    }

    #[test]
    fn primary_wins_when_present() {
        let value: i64 = select_first(&text("76221"), &text("43720"));
        assert_eq!(value, 76221);
        let value: i64 = select_first(&text("43720"), &FieldValue::Null);
        assert_eq!(value, 43720);
    }

    #[test]
    fn nan_primary_falls_back() {
        let value: i64 = select_first(&FieldValue::Float(f64::NAN), &text("43720"));
        assert_eq!(value, 43720);
    }

    #[test]
    fn unconvertible_primary_falls_back() {
        let value: i64 = select_first(&text("43720.5"), &text("43720"));
        assert_eq!(value, 43720);
        let value: f64 = select_first(&text("n/a"), &FieldValue::Float(28.5));
        assert_eq!(value, 28.5);
    }

    #[test]
    fn float_selection() {
        let value: f64 = select_first(&FieldValue::Null, &text("-97.1234"));
        assert_eq!(value, -97.1234);
    }

    #[test]
    fn derived_column_uses_first_present() {
        let df = DataFrame::new(vec![
            Series::new("USER3".into(), vec![None, Some("76221"), None]).into(),
            Series::new("PRESPUDWELLID".into(), vec![Some("43720"), Some("1"), None]).into(),
        ])
        .unwrap();
        let derived = DerivedColumn::new("PSID_AR", "USER3", "PRESPUDWELLID", ScalarKind::Integer);
        let series = derive_column(&df, &derived).unwrap();
        let values: Vec<Option<i64>> = series.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(43720), Some(76221), Some(0)]);
    }

    #[test]
    fn derived_with_missing_input_is_skipped() {
        let df = DataFrame::new(vec![Series::new("USER3".into(), vec![Some("1")]).into()]).unwrap();
        let derived = [DerivedColumn::new(
            "PSID_AR",
            "USER3",
            "PRESPUDWELLID",
            ScalarKind::Integer,
        )];
        let out = with_derived_columns(df, &derived).unwrap();
        assert!(!has_column(&out, "PSID_AR"));
    }

    proptest! {
        #[test]
        fn present_primary_always_wins(primary in any::<i64>(), secondary in any::<i64>()) {
            let value: i64 =
                select_first(&FieldValue::Integer(primary), &FieldValue::Integer(secondary));
            prop_assert_eq!(value, primary);
        }

        #[test]
        fn absent_primary_takes_secondary(secondary in any::<i64>()) {
            let value: i64 = select_first(&FieldValue::Null, &FieldValue::Integer(secondary));
            prop_assert_eq!(value, secondary);
        }
    }
}
