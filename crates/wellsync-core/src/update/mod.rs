//! Selective ledger updates.
//!
//! A diff table is staged as a temporary table, then the ledger column is
//! set from it for the rows classified as needing an update. Rows are
//! selected by their match class, never by label text, since labels are
//! free-form and may collide. Stores decide how
//! staging and the update are carried out; [`update_table`] only decides
//! what to stage and which rows to touch.

pub mod sql;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::{info, info_span};
use wellsync_common::has_column;
use wellsync_model::{
    FilterPredicate, JoinPath, MatchClass, PredicateSource, SqlType, TargetTable,
};

use crate::compare::DiffTable;
use crate::error::{ReconcileError, Result, StoreError};

/// Staging column types, by column name.
pub type TypeHints = BTreeMap<String, SqlType>;

/// Staged column holding each row's [`MatchClass`] name.
pub const CLASS_COLUMN: &str = "MATCH_CLASS";

static STAGING_SEQUENCE: AtomicUsize = AtomicUsize::new(0);

/// Temporary table name, unique per call within the process.
pub fn staging_name(column: &str) -> String {
    let seq = STAGING_SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
    let column: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("#check_{seq}_{column}")
}

/// Rows to stage before an update.
#[derive(Debug, Clone)]
pub struct StagedTable {
    pub name: String,
    pub hints: TypeHints,
    pub data: DataFrame,
}

/// One scoped ledger update, read against a staged table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDirective {
    pub target: TargetTable,
    pub staging: String,
    /// Business key column of the staged table.
    pub key_column: String,
    /// Staged column holding the planning value.
    pub value_column: String,
    /// Ledger column being set.
    pub set_column: String,
    /// Staged column holding the match class of each row.
    pub class_column: String,
    /// Staged rows of one of these classes are applied.
    pub update_classes: Vec<MatchClass>,
    pub condition: Option<FilterPredicate>,
}

impl UpdateDirective {
    pub fn join_path(&self) -> JoinPath {
        self.target.join_path()
    }

    /// Class names as staged in `class_column`.
    pub fn update_class_names(&self) -> Vec<&'static str> {
        self.update_classes.iter().map(|class| class.as_str()).collect()
    }

    /// The user attribute table is joined only when the condition reads it.
    pub fn joins_user_table(&self) -> bool {
        self.condition
            .as_ref()
            .is_some_and(|condition| condition.source == PredicateSource::User)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub staged_rows: usize,
    /// Rows classified for update in the diff table.
    pub pending: usize,
    /// Ledger rows written, when the store can tell.
    pub rows_affected: Option<usize>,
}

/// A ledger that can take staged rows and apply scoped updates.
pub trait LedgerStore {
    fn stage(&mut self, table: &StagedTable) -> std::result::Result<(), StoreError>;

    /// Applies the update and returns the number of rows written, if known.
    fn apply(
        &mut self,
        directive: &UpdateDirective,
    ) -> std::result::Result<Option<usize>, StoreError>;
}

/// Pushes planning values from `diff` into `ledger_column` of `target`.
///
/// Only rows classified as a mismatch or a missing ledger value are written,
/// further narrowed by `condition`. Running it twice in a row changes
/// nothing the second time.
pub fn update_table<S: LedgerStore + ?Sized>(
    store: &mut S,
    target: TargetTable,
    diff: &DiffTable,
    planning_column: &str,
    ledger_column: &str,
    hints: &TypeHints,
    condition: Option<&FilterPredicate>,
) -> Result<UpdateOutcome> {
    let staged_columns = [diff.key_column.as_str(), planning_column];
    if let Some(missing) = staged_columns.iter().find(|c| !has_column(&diff.data, c)) {
        return Err(ReconcileError::missing_column("diff", *missing));
    }
    let classes: Vec<&str> = diff.classes.iter().map(|class| class.as_str()).collect();
    let mut data = diff.data.select(staged_columns)?;
    data.with_column(Series::new(CLASS_COLUMN.into(), classes))?;

    let staged = StagedTable {
        name: staging_name(ledger_column),
        hints: hints.clone(),
        data,
    };
    let span = info_span!(
        "update",
        table = %target,
        column = ledger_column,
        staging = %staged.name
    );
    let _guard = span.enter();

    store.stage(&staged)?;
    let directive = UpdateDirective {
        target,
        staging: staged.name.clone(),
        key_column: diff.key_column.clone(),
        value_column: planning_column.to_string(),
        set_column: ledger_column.to_string(),
        class_column: CLASS_COLUMN.to_string(),
        update_classes: MatchClass::ALL
            .into_iter()
            .filter(|class| class.needs_ledger_update())
            .collect(),
        condition: condition.cloned(),
    };
    let rows_affected = store.apply(&directive)?;

    let outcome = UpdateOutcome {
        staged_rows: staged.data.height(),
        pending: diff.pending_updates(),
        rows_affected,
    };
    info!(
        pending = outcome.pending,
        rows_affected = ?outcome.rows_affected,
        "ledger column updated"
    );
    Ok(outcome)
}
