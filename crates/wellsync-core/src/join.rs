//! Joining the planning and ledger datasets on the business key.

use std::collections::{BTreeSet, HashMap};

use polars::prelude::{BooleanChunked, Column, DataFrame, IntoColumn, NewChunkedArray};
use tracing::{debug, info};
use wellsync_common::{FieldValue, column_values, has_column, series_with_dtype};
use wellsync_model::SyncProfile;

use crate::error::{ReconcileError, Result};

/// Left join output with the output names of both key columns.
#[derive(Debug, Clone)]
pub struct LeftJoin {
    pub frame: DataFrame,
    pub left_key: String,
    pub right_key: String,
}

fn key_text(value: &FieldValue) -> Option<String> {
    value.as_text()
}

/// Gathers rows by index; `None` produces an all-null row.
fn gather(
    df: &DataFrame,
    rows: &[Option<usize>],
    rename: impl Fn(&str) -> String,
) -> Result<Vec<Column>> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let values = column_values(df, column.name().as_str())?;
        let picked: Vec<FieldValue> = rows
            .iter()
            .map(|row| row.map_or(FieldValue::Null, |idx| values[idx].clone()))
            .collect();
        let name = rename(column.name().as_str());
        columns.push(series_with_dtype(&name, &picked, column.dtype())?.into_column());
    }
    Ok(columns)
}

/// Left join on `left_key = right_key`.
///
/// Every left row is kept; a left key matching several right rows yields one
/// row per match. Null keys never match. Column names present on both sides
/// receive the side's suffix; when both keys share a name the right key is
/// dropped and the key is left unsuffixed.
pub fn left_join(
    left: &DataFrame,
    right: &DataFrame,
    left_key: &str,
    right_key: &str,
    left_suffix: &str,
    right_suffix: &str,
) -> Result<LeftJoin> {
    if !has_column(left, left_key) {
        return Err(ReconcileError::missing_column("left", left_key));
    }
    if !has_column(right, right_key) {
        return Err(ReconcileError::missing_column("right", right_key));
    }

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (row, value) in column_values(right, right_key)?.iter().enumerate() {
        if let Some(key) = key_text(value) {
            index.entry(key).or_default().push(row);
        }
    }

    let mut left_rows = Vec::with_capacity(left.height());
    let mut right_rows = Vec::with_capacity(left.height());
    for (row, value) in column_values(left, left_key)?.iter().enumerate() {
        match key_text(value).and_then(|key| index.get(&key)) {
            Some(matches) => {
                for matched in matches {
                    left_rows.push(Some(row));
                    right_rows.push(Some(*matched));
                }
            }
            None => {
                left_rows.push(Some(row));
                right_rows.push(None);
            }
        }
    }

    let shared_key = left_key == right_key;
    let right = if shared_key {
        right.drop(right_key)?
    } else {
        right.clone()
    };
    let left_names: BTreeSet<String> = left
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let overlap: BTreeSet<String> = right
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| left_names.contains(name))
        .collect();
    let output_name = |name: &str, suffix: &str| {
        if overlap.contains(name) {
            format!("{name}{suffix}")
        } else {
            name.to_string()
        }
    };

    let mut columns = gather(left, &left_rows, |name| output_name(name, left_suffix))?;
    columns.extend(gather(&right, &right_rows, |name| output_name(name, right_suffix))?);
    let frame = DataFrame::new(columns)?;

    let left_key_out = output_name(left_key, left_suffix);
    let right_key_out = if shared_key {
        left_key_out.clone()
    } else {
        output_name(right_key, right_suffix)
    };
    debug!(
        left_rows = left.height(),
        right_rows = right.height(),
        output_rows = frame.height(),
        "left join"
    );
    Ok(LeftJoin {
        frame,
        left_key: left_key_out,
        right_key: right_key_out,
    })
}

/// Inner join on a key shared by name. Right columns already present on the
/// left are dropped; the left side wins.
pub fn inner_join_on(left: &DataFrame, right: &DataFrame, key: &str) -> Result<DataFrame> {
    let left_names: BTreeSet<String> = left
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let keep: Vec<String> = right
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| name == key || !left_names.contains(name))
        .collect();
    let right = right.select(keep)?;
    let joined = left_join(left, &right, key, key, "", "")?;
    // Drop left rows without a right match.
    let right_keys: BTreeSet<String> = column_values(&right, key)?
        .iter()
        .filter_map(key_text)
        .collect();
    let mask: Vec<bool> = column_values(&joined.frame, key)?
        .iter()
        .map(|value| key_text(value).is_some_and(|key| right_keys.contains(&key)))
        .collect();
    filter_rows(&joined.frame, &mask)
}

fn filter_rows(df: &DataFrame, mask: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), mask);
    Ok(df.filter(&mask)?)
}

/// Key and suffix conventions of one join, taken from the sync profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub planning_key: String,
    pub ledger_key: String,
    pub planning_suffix: String,
    pub ledger_suffix: String,
    pub planning_orphan_columns: Vec<String>,
    pub ledger_orphan_columns: Vec<String>,
}

impl From<&SyncProfile> for JoinSpec {
    fn from(profile: &SyncProfile) -> Self {
        Self {
            planning_key: profile.planning_key.clone(),
            ledger_key: profile.ledger_key.clone(),
            planning_suffix: profile.planning_suffix.clone(),
            ledger_suffix: profile.ledger_suffix.clone(),
            planning_orphan_columns: profile.planning_orphan_columns.clone(),
            ledger_orphan_columns: profile.ledger_orphan_columns.clone(),
        }
    }
}

/// Both directional joins, the orphan reports and the working set.
#[derive(Debug, Clone)]
pub struct JoinedDatasets {
    /// Planning left-joined with the ledger.
    pub planning_joined: DataFrame,
    /// Ledger left-joined with planning.
    pub ledger_joined: DataFrame,
    /// Planning rows with no ledger match, projected to the orphan columns.
    pub in_planning_not_ledger: DataFrame,
    /// Ledger rows with no planning match, projected to the orphan columns.
    pub in_ledger_not_planning: DataFrame,
    /// Ledger-driven join restricted to rows with both keys present. Every
    /// comparison runs over this frame.
    pub working: DataFrame,
}

fn non_null_mask(df: &DataFrame, column: &str) -> Result<Vec<bool>> {
    Ok(column_values(df, column)?
        .iter()
        .map(|value| !value.is_null())
        .collect())
}

fn orphans(joined: &LeftJoin, columns: &[String], dataset: &str) -> Result<DataFrame> {
    if let Some(missing) = columns.iter().find(|column| !has_column(&joined.frame, column)) {
        return Err(ReconcileError::missing_column(dataset, missing.as_str()));
    }
    let mask: Vec<bool> = non_null_mask(&joined.frame, &joined.right_key)?
        .into_iter()
        .map(|present| !present)
        .collect();
    let unmatched = filter_rows(&joined.frame, &mask)?;
    Ok(unmatched.select(columns.iter().cloned())?)
}

/// Joins planning and ledger both ways and derives the orphan reports and
/// the working set.
pub fn join_datasets(
    planning: &DataFrame,
    ledger: &DataFrame,
    spec: &JoinSpec,
) -> Result<JoinedDatasets> {
    if !has_column(planning, &spec.planning_key) {
        return Err(ReconcileError::missing_column("planning", spec.planning_key.as_str()));
    }
    if !has_column(ledger, &spec.ledger_key) {
        return Err(ReconcileError::missing_column("ledger", spec.ledger_key.as_str()));
    }

    let planning_joined = left_join(
        planning,
        ledger,
        &spec.planning_key,
        &spec.ledger_key,
        &spec.planning_suffix,
        &spec.ledger_suffix,
    )?;
    let ledger_joined = left_join(
        ledger,
        planning,
        &spec.ledger_key,
        &spec.planning_key,
        &spec.ledger_suffix,
        &spec.planning_suffix,
    )?;

    let in_planning_not_ledger =
        orphans(&planning_joined, &spec.planning_orphan_columns, "planning join")?;
    let in_ledger_not_planning =
        orphans(&ledger_joined, &spec.ledger_orphan_columns, "ledger join")?;

    let both: Vec<bool> = non_null_mask(&ledger_joined.frame, &ledger_joined.left_key)?
        .into_iter()
        .zip(non_null_mask(&ledger_joined.frame, &ledger_joined.right_key)?)
        .map(|(ledger_key, planning_key)| ledger_key && planning_key)
        .collect();
    let working = filter_rows(&ledger_joined.frame, &both)?;

    info!(
        planning_rows = planning.height(),
        ledger_rows = ledger.height(),
        working_rows = working.height(),
        planning_orphans = in_planning_not_ledger.height(),
        ledger_orphans = in_ledger_not_planning.height(),
        "joined datasets"
    );

    Ok(JoinedDatasets {
        planning_joined: planning_joined.frame,
        ledger_joined: ledger_joined.frame,
        in_planning_not_ledger,
        in_ledger_not_planning,
        working,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn frame(columns: &[(&str, &[Option<&str>])]) -> DataFrame {
        DataFrame::new(
            columns
                .iter()
                .map(|(name, values)| Series::new((*name).into(), values.to_vec()).into_column())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn overlapping_names_get_suffixes() {
        let left = frame(&[("ID", &[Some("1")]), ("NAME", &[Some("a")])]);
        let right = frame(&[("CODE", &[Some("1")]), ("NAME", &[Some("b")])]);
        let joined = left_join(&left, &right, "ID", "CODE", "_DP", "_AR").unwrap();
        let names: Vec<String> = joined
            .frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, vec!["ID", "NAME_DP", "CODE", "NAME_AR"]);
        assert_eq!(joined.right_key, "CODE");
    }

    #[test]
    fn null_keys_stay_unmatched() {
        let left = frame(&[("ID", &[None, Some("1")])]);
        let right = frame(&[("CODE", &[None, Some("1")])]);
        let joined = left_join(&left, &right, "ID", "CODE", "_L", "_R").unwrap();
        assert_eq!(joined.frame.height(), 2);
        assert_eq!(joined.frame.column("CODE").unwrap().null_count(), 1);
    }

    #[test]
    fn inner_join_keeps_left_columns() {
        let left = frame(&[
            ("PROPNUM", &[Some("P1"), Some("P2")]),
            ("LEASE", &[Some("a"), Some("b")]),
        ]);
        let right = frame(&[
            ("PROPNUM", &[Some("P2")]),
            ("LEASE", &[Some("x")]),
            ("PLANNED_LL", &[Some("10")]),
        ]);
        let joined = inner_join_on(&left, &right, "PROPNUM").unwrap();
        assert_eq!(joined.height(), 1);
        assert_eq!(joined.width(), 3);
        assert_eq!(
            joined.column("LEASE").unwrap().get(0).unwrap().str_value(),
            "b"
        );
    }
}
