//! In-memory ledger store.
//!
//! Holds the ledger tables as frames and applies staged updates with the
//! same join and filter semantics as the T-SQL statements: inner joins,
//! SQL NULL comparisons, and only rows classified for update.

use std::collections::{BTreeMap, HashMap};

use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::{debug, info};
use wellsync_common::{FieldValue, column_values, has_column, series_with_dtype};
use wellsync_model::{
    FilterPredicate, JoinPath, PROPERTY_NUMBER, PredicateSource, SqlType, TargetTable,
};

use crate::error::{ReconcileError, StoreError};
use crate::join::inner_join_on;
use crate::update::{LedgerStore, StagedTable, UpdateDirective};

#[derive(Debug, Clone)]
pub struct MemoryLedger {
    property: DataFrame,
    budget: DataFrame,
    user: Option<DataFrame>,
    staged: BTreeMap<String, DataFrame>,
}

impl MemoryLedger {
    pub fn new(property: DataFrame, budget: DataFrame) -> Self {
        Self {
            property,
            budget,
            user: None,
            staged: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_user_table(mut self, user: DataFrame) -> Self {
        self.user = Some(user);
        self
    }

    pub fn table(&self, target: TargetTable) -> &DataFrame {
        match target {
            TargetTable::PropertyBase => &self.property,
            TargetTable::BudgetBase => &self.budget,
        }
    }

    pub fn user_table(&self) -> Option<&DataFrame> {
        self.user.as_ref()
    }

    /// Property rows joined with their budget rows on property number.
    pub fn ledger_view(&self) -> Result<DataFrame, ReconcileError> {
        inner_join_on(&self.property, &self.budget, PROPERTY_NUMBER)
    }

    fn table_mut(&mut self, target: TargetTable) -> &mut DataFrame {
        match target {
            TargetTable::PropertyBase => &mut self.property,
            TargetTable::BudgetBase => &mut self.budget,
        }
    }
}

fn staging_error(table: &StagedTable, message: String) -> StoreError {
    StoreError::Staging {
        table: table.name.clone(),
        message,
    }
}

/// Converts one staged column to its hinted type, rejecting values the
/// column type cannot hold.
fn typed_column(
    table: &StagedTable,
    column: &str,
    sql_type: SqlType,
) -> Result<Series, StoreError> {
    let values = column_values(&table.data, column)?;
    let series = match sql_type {
        SqlType::VarChar(limit) => {
            let mut data = Vec::with_capacity(values.len());
            for value in &values {
                let text = value.as_text();
                if let Some(text) = &text {
                    if text.chars().count() > usize::from(limit) {
                        return Err(staging_error(
                            table,
                            format!("{column} value {text:?} is longer than {limit} characters"),
                        ));
                    }
                }
                data.push(text);
            }
            Series::new(column.into(), data)
        }
        SqlType::Float => {
            let finite = |value: &FieldValue| value.as_f64().filter(|number| number.is_finite());
            let data = convert(table, column, &values, finite, "a finite number")?;
            Series::new(column.into(), data)
        }
        SqlType::Integer => {
            let data = convert(table, column, &values, FieldValue::as_i64, "an integer")?;
            Series::new(column.into(), data)
        }
    };
    Ok(series)
}

fn convert<T>(
    table: &StagedTable,
    column: &str,
    values: &[FieldValue],
    to: impl Fn(&FieldValue) -> Option<T>,
    expected: &str,
) -> Result<Vec<Option<T>>, StoreError> {
    values
        .iter()
        .map(|value| {
            if value.is_null() {
                return Ok(None);
            }
            to(value).map(Some).ok_or_else(|| {
                staging_error(table, format!("{column} value {value} is not {expected}"))
            })
        })
        .collect()
}

fn update_error(directive: &UpdateDirective, message: impl Into<String>) -> StoreError {
    StoreError::Update {
        table: directive.target.table_name().to_string(),
        column: directive.set_column.clone(),
        message: message.into(),
    }
}

fn texts(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, StoreError> {
    Ok(column_values(df, column)?
        .iter()
        .map(FieldValue::as_text)
        .collect())
}

fn group_rows(keys: &[Option<String>]) -> HashMap<&str, Vec<usize>> {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        if let Some(key) = key {
            groups.entry(key.as_str()).or_default().push(row);
        }
    }
    groups
}

/// Evaluates an update condition for one (primary row, target row) pair.
struct Condition<'a> {
    predicate: &'a FilterPredicate,
    values: Vec<Option<String>>,
    /// Property number per primary row and user rows per property number,
    /// for user-table predicates.
    user: Option<(Vec<Option<String>>, HashMap<String, Vec<usize>>)>,
}

impl Condition<'_> {
    fn holds(&self, primary_row: usize, target_row: usize) -> bool {
        match self.predicate.source {
            PredicateSource::Primary => self.predicate.matches(self.values[primary_row].as_deref()),
            PredicateSource::Target => self.predicate.matches(self.values[target_row].as_deref()),
            PredicateSource::User => {
                let Some((property_numbers, user_rows)) = &self.user else {
                    return false;
                };
                property_numbers[primary_row]
                    .as_ref()
                    .and_then(|number| user_rows.get(number))
                    .is_some_and(|rows| {
                        rows.iter()
                            .any(|row| self.predicate.matches(self.values[*row].as_deref()))
                    })
            }
        }
    }
}

impl MemoryLedger {
    fn condition<'a>(
        &self,
        directive: &'a UpdateDirective,
    ) -> Result<Option<Condition<'a>>, StoreError> {
        let Some(predicate) = &directive.condition else {
            return Ok(None);
        };
        let source = match predicate.source {
            PredicateSource::Primary => &self.property,
            PredicateSource::Target => self.table(directive.target),
            PredicateSource::User => self
                .user
                .as_ref()
                .ok_or_else(|| update_error(directive, "no user attribute table loaded"))?,
        };
        if !has_column(source, &predicate.column) {
            return Err(update_error(
                directive,
                format!("condition column {} not found", predicate.column),
            ));
        }
        let values = texts(source, &predicate.column)?;
        let user = if predicate.source == PredicateSource::User {
            let user_numbers = texts(source, PROPERTY_NUMBER)?;
            let mut user_rows: HashMap<String, Vec<usize>> = HashMap::new();
            for (row, number) in user_numbers.into_iter().enumerate() {
                if let Some(number) = number {
                    user_rows.entry(number).or_default().push(row);
                }
            }
            Some((texts(&self.property, PROPERTY_NUMBER)?, user_rows))
        } else {
            None
        };
        Ok(Some(Condition {
            predicate,
            values,
            user,
        }))
    }

    /// Staged values to apply, by business key. The last row of an update
    /// class wins for a key.
    fn pending_values(
        &self,
        directive: &UpdateDirective,
    ) -> Result<HashMap<String, FieldValue>, StoreError> {
        let staged = self
            .staged
            .get(&directive.staging)
            .ok_or_else(|| StoreError::NotStaged(directive.staging.clone()))?;
        for column in [
            &directive.key_column,
            &directive.value_column,
            &directive.class_column,
        ] {
            if !has_column(staged, column) {
                return Err(update_error(
                    directive,
                    format!("staged table has no column {column}"),
                ));
            }
        }
        let keys = texts(staged, &directive.key_column)?;
        let values = column_values(staged, &directive.value_column)?;
        let classes = texts(staged, &directive.class_column)?;
        let update_classes = directive.update_class_names();

        let mut pending = HashMap::new();
        for ((key, value), class) in keys.into_iter().zip(values).zip(classes) {
            let selected = class
                .as_deref()
                .is_some_and(|class| update_classes.contains(&class));
            if let (Some(key), true) = (key, selected) {
                pending.insert(key, value);
            }
        }
        Ok(pending)
    }
}

impl LedgerStore for MemoryLedger {
    fn stage(&mut self, table: &StagedTable) -> Result<(), StoreError> {
        let mut data = table.data.clone();
        for (column, sql_type) in &table.hints {
            if !has_column(&data, column) {
                return Err(staging_error(
                    table,
                    format!("type hint for missing column {column}"),
                ));
            }
            data.with_column(typed_column(table, column, *sql_type)?)?;
        }
        debug!(table = %table.name, rows = data.height(), "staged");
        self.staged.insert(table.name.clone(), data);
        Ok(())
    }

    fn apply(&mut self, directive: &UpdateDirective) -> Result<Option<usize>, StoreError> {
        let pending = self.pending_values(directive)?;
        let condition = self.condition(directive)?;

        if !has_column(&self.property, &directive.key_column) {
            return Err(update_error(
                directive,
                format!("{} has no column {}", TargetTable::PRIMARY, directive.key_column),
            ));
        }
        let target = self.table(directive.target);
        if !has_column(target, &directive.set_column) {
            return Err(update_error(directive, "column not found"));
        }
        let dtype = target.column(&directive.set_column)?.dtype().clone();
        let mut values = column_values(target, &directive.set_column)?;
        let primary_keys = texts(&self.property, &directive.key_column)?;

        // (target row, primary row) pairs produced by the update's joins.
        let pairs: Vec<(usize, usize)> = match directive.join_path() {
            JoinPath::Direct => (0..self.property.height()).map(|row| (row, row)).collect(),
            JoinPath::ThroughPrimary => {
                let primary_numbers = texts(&self.property, PROPERTY_NUMBER)?;
                let target_numbers = texts(target, PROPERTY_NUMBER)?;
                let by_number = group_rows(&primary_numbers);
                target_numbers
                    .iter()
                    .enumerate()
                    .filter_map(|(row, number)| {
                        number
                            .as_deref()
                            .and_then(|number| by_number.get(number))
                            .map(|primary_rows| (row, primary_rows))
                    })
                    .flat_map(|(row, primary_rows)| {
                        primary_rows.iter().map(move |primary| (row, *primary))
                    })
                    .collect()
            }
        };

        let mut written = vec![false; values.len()];
        for (target_row, primary_row) in pairs {
            let Some(value) = primary_keys[primary_row]
                .as_ref()
                .and_then(|key| pending.get(key))
            else {
                continue;
            };
            if let Some(condition) = &condition {
                if !condition.holds(primary_row, target_row) {
                    continue;
                }
            }
            values[target_row] = value.clone();
            written[target_row] = true;
        }
        let rows_affected = written.iter().filter(|w| **w).count();

        let series = series_with_dtype(&directive.set_column, &values, &dtype)?;
        self.table_mut(directive.target).with_column(series)?;
        info!(
            table = %directive.target,
            column = %directive.set_column,
            rows_affected,
            "applied update"
        );
        Ok(Some(rows_affected))
    }
}
