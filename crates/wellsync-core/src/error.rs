//! Error types for reconciliation and ledger writes.

use polars::prelude::PolarsError;
use thiserror::Error;
use wellsync_model::ProfileError;

/// Errors surfaced by the reconciliation engine.
///
/// Unconvertible or absent cell values are never errors; they are folded
/// into the match classification instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{dataset} dataset has no column {column}")]
    MissingColumn { dataset: String, column: String },
    #[error("invalid profile: {0}")]
    Profile(#[from] ProfileError),
    #[error("ledger store: {0}")]
    Store(#[from] StoreError),
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

impl ReconcileError {
    pub fn missing_column(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            dataset: dataset.into(),
            column: column.into(),
        }
    }
}

/// Errors raised by a ledger store while staging or updating.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("staging {table} failed: {message}")]
    Staging { table: String, message: String },
    #[error("update of {table}.{column} failed: {message}")]
    Update {
        table: String,
        column: String,
        message: String,
    },
    #[error("no staged table named {0}")]
    NotStaged(String),
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
