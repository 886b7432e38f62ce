//! Data model for planning/ledger well reconciliation.

pub mod catalog;
pub mod classification;
pub mod error;
pub mod profile;
pub mod target;

pub use classification::{MatchClass, MatchLabels};
pub use error::{ProfileError, Result};
pub use profile::{ComparisonKind, DerivedColumn, FieldCheck, ScalarKind, SyncProfile};
pub use target::{
    BUSINESS_KEY, CompareOp, FilterPredicate, JoinPath, PROPERTY_NUMBER, PredicateSource, SqlType,
    TargetTable, USER_TABLE,
};
