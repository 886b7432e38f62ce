//! Five-way classification of a planning/ledger value pair.

use wellsync_common::FieldValue;
use wellsync_model::{MatchClass, MatchLabels};

/// Classifies one pair by presence and exact equality.
///
/// Null and NaN are absent. Nothing is trimmed or case-folded.
pub fn classify(planning: &FieldValue, ledger: &FieldValue) -> MatchClass {
    MatchClass::from_presence(!planning.is_null(), !ledger.is_null(), || {
        planning.same_value(ledger)
    })
}

pub fn classify_label<'a>(
    planning: &FieldValue,
    ledger: &FieldValue,
    labels: &'a MatchLabels,
) -> &'a str {
    labels.label(classify(planning, ledger))
}

/// Rounds to `precision` decimal digits, half to even. Negative precision
/// rounds to tens, hundreds and so on.
pub fn round_to(value: f64, precision: i32) -> f64 {
    if precision >= 0 {
        let factor = 10f64.powi(precision);
        (value * factor).round_ties_even() / factor
    } else {
        let factor = 10f64.powi(-precision);
        (value / factor).round_ties_even() * factor
    }
}

/// Classifies a numerically coerced pair.
///
/// Zero counts as absent on either side. Returns the rounded delta
/// (`planning - ledger`, `None` unless both sides coerced) with the class.
pub fn classify_numeric(
    planning: Option<f64>,
    ledger: Option<f64>,
    precision: i32,
) -> (Option<f64>, MatchClass) {
    let delta = match (planning, ledger) {
        (Some(p), Some(l)) => Some(round_to(p - l, precision)),
        _ => None,
    };
    let present = |value: Option<f64>| value.is_some_and(|v| v != 0.0);
    let class = MatchClass::from_presence(present(planning), present(ledger), || {
        delta.is_some_and(|d| d == 0.0)
    });
    (delta, class)
}
