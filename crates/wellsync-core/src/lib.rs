//! Reconciliation engine for planning and ledger well records.
//!
//! - **join**: left joins of the two datasets with origin suffixes, orphan detection
//! - **selector**: first-present value selection with lenient coercion
//! - **classifier**: five-way match classification of one field pair
//! - **compare**: textual and numeric comparators producing diff tables
//! - **update**: staging and scoped ledger updates, T-SQL rendering
//! - **store**: in-memory ledger store
//! - **session**: one reconciliation run driven by a sync profile

pub mod classifier;
pub mod compare;
pub mod error;
pub mod join;
pub mod selector;
pub mod session;
pub mod store;
pub mod update;

pub use classifier::{classify, classify_label, classify_numeric, round_to};
pub use compare::{
    DELTA_COLUMN, DiffLayout, DiffTable, MATCH_COLUMN, compare_columns, compare_numeric_columns,
};
pub use error::{ReconcileError, Result, StoreError};
pub use join::{JoinSpec, JoinedDatasets, LeftJoin, inner_join_on, join_datasets, left_join};
pub use selector::{Coerce, derive_column, select_first, with_derived_columns};
pub use session::{AppliedUpdate, CheckRun, ReconcileSession, SkipReason, UpdateReport};
pub use store::MemoryLedger;
pub use update::sql::{SqlDialect, SqlScript};
pub use update::{
    CLASS_COLUMN, LedgerStore, StagedTable, TypeHints, UpdateDirective, UpdateOutcome,
    staging_name,
    update_table,
};
