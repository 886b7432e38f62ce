//! Field comparators: one diff table per compared field pair.

use std::collections::BTreeMap;

use polars::prelude::{DataFrame, NamedFrom, Series};
use wellsync_common::{FieldValue, column_values, has_column};
use wellsync_model::{BUSINESS_KEY, ComparisonKind, MatchClass, MatchLabels};

use crate::classifier::{classify, classify_numeric};
use crate::error::{ReconcileError, Result};

pub const MATCH_COLUMN: &str = "MATCH";
pub const DELTA_COLUMN: &str = "DELTA";

/// Identifying columns carried into every diff table ahead of the compared
/// values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLayout {
    pub key_column: String,
    pub lease_column: String,
}

impl DiffLayout {
    pub fn new(key_column: impl Into<String>, lease_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            lease_column: lease_column.into(),
        }
    }

    fn leading_columns(&self, planning: &str, ledger: &str) -> Vec<String> {
        let mut columns = vec![self.key_column.clone()];
        if self.lease_column != planning && self.lease_column != ledger {
            columns.push(self.lease_column.clone());
        }
        columns.push(planning.to_string());
        if ledger != planning {
            columns.push(ledger.to_string());
        }
        columns
    }
}

impl Default for DiffLayout {
    fn default() -> Self {
        Self::new(BUSINESS_KEY, "LEASE")
    }
}

/// Row-aligned comparison result for one field pair.
///
/// `data` holds the key, lease, planning value, ledger value (and `DELTA` for
/// numeric comparisons) and the `MATCH` label column. `classes` holds the
/// class behind each label, in row order.
#[derive(Debug, Clone)]
pub struct DiffTable {
    pub name: String,
    pub key_column: String,
    pub planning_column: String,
    pub ledger_column: String,
    pub kind: ComparisonKind,
    pub labels: MatchLabels,
    pub classes: Vec<MatchClass>,
    pub data: DataFrame,
}

impl DiffTable {
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn height(&self) -> usize {
        self.classes.len()
    }

    pub fn class_counts(&self) -> BTreeMap<MatchClass, usize> {
        let mut counts = BTreeMap::new();
        for class in &self.classes {
            *counts.entry(*class).or_insert(0) += 1;
        }
        counts
    }

    /// Row count per label; classes sharing a label are summed.
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for class in &self.classes {
            *counts
                .entry(self.labels.label(*class).to_string())
                .or_insert(0) += 1;
        }
        counts
    }

    /// Rows whose ledger value should be overwritten.
    pub fn pending_updates(&self) -> usize {
        self.classes
            .iter()
            .filter(|class| class.needs_ledger_update())
            .count()
    }
}

fn require(joined: &DataFrame, columns: &[String]) -> Result<()> {
    match columns.iter().find(|column| !has_column(joined, column)) {
        Some(column) => Err(ReconcileError::missing_column("joined", column.as_str())),
        None => Ok(()),
    }
}

fn label_series(labels: &MatchLabels, classes: &[MatchClass]) -> Series {
    let data: Vec<&str> = classes.iter().map(|class| labels.label(*class)).collect();
    Series::new(MATCH_COLUMN.into(), data)
}

/// Compares two columns by exact value equality.
pub fn compare_columns(
    planning: &str,
    ledger: &str,
    joined: &DataFrame,
    labels: &MatchLabels,
    layout: &DiffLayout,
) -> Result<DiffTable> {
    let columns = layout.leading_columns(planning, ledger);
    require(joined, &columns)?;

    let planning_values = column_values(joined, planning)?;
    let ledger_values = column_values(joined, ledger)?;
    let classes: Vec<MatchClass> = planning_values
        .iter()
        .zip(&ledger_values)
        .map(|(p, l)| classify(p, l))
        .collect();

    let mut data = joined.select(columns)?;
    data.with_column(label_series(labels, &classes))?;

    Ok(DiffTable {
        name: ledger.to_string(),
        key_column: layout.key_column.clone(),
        planning_column: planning.to_string(),
        ledger_column: ledger.to_string(),
        kind: ComparisonKind::Text,
        labels: labels.clone(),
        classes,
        data,
    })
}

/// Compares two columns numerically.
///
/// Both columns are coerced to float (unparsable becomes null) and replaced
/// in the output. `DELTA` is `planning - ledger` rounded to `precision`
/// digits; zero is treated as absent for classification.
pub fn compare_numeric_columns(
    planning: &str,
    ledger: &str,
    joined: &DataFrame,
    precision: i32,
    labels: &MatchLabels,
    layout: &DiffLayout,
) -> Result<DiffTable> {
    let columns = layout.leading_columns(planning, ledger);
    require(joined, &columns)?;

    let planning_values: Vec<Option<f64>> = column_values(joined, planning)?
        .iter()
        .map(FieldValue::as_f64)
        .collect();
    let ledger_values: Vec<Option<f64>> = column_values(joined, ledger)?
        .iter()
        .map(FieldValue::as_f64)
        .collect();

    let (deltas, classes): (Vec<Option<f64>>, Vec<MatchClass>) = planning_values
        .iter()
        .zip(&ledger_values)
        .map(|(p, l)| classify_numeric(*p, *l, precision))
        .unzip();

    let mut data = joined.select(columns)?;
    data.with_column(Series::new(planning.into(), planning_values))?;
    data.with_column(Series::new(ledger.into(), ledger_values))?;
    data.with_column(Series::new(DELTA_COLUMN.into(), deltas))?;
    data.with_column(label_series(labels, &classes))?;

    Ok(DiffTable {
        name: ledger.to_string(),
        key_column: layout.key_column.clone(),
        planning_column: planning.to_string(),
        ledger_column: ledger.to_string(),
        kind: ComparisonKind::Numeric { precision },
        labels: labels.clone(),
        classes,
        data,
    })
}
