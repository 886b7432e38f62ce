//! Ledger tables that the selective updater may write to.
//!
//! Only one ledger table carries the business key natively. Every other
//! table is reached through it by property number, so each target declares
//! its join path instead of the caller branching on table names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Business key column in the ledger (the Aries code).
pub const BUSINESS_KEY: &str = "ARIES_CODE";
/// Internal property number shared by every ledger table.
pub const PROPERTY_NUMBER: &str = "PROPNUM";
/// Ledger table holding user-defined property attributes.
pub const USER_TABLE: &str = "AC_USER";

/// How a target table reaches the business key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPath {
    /// The table carries the business key; staged rows join it directly.
    Direct,
    /// The table is joined to the primary entity table by property number,
    /// and the staged rows join the primary table by business key.
    ThroughPrimary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTable {
    /// Master property table (`AC_PROPERTY_BASE`), the primary entity table.
    PropertyBase,
    /// Budget table (`AC_BUDGET_BASE`).
    BudgetBase,
}

impl TargetTable {
    pub const PRIMARY: Self = Self::PropertyBase;

    pub fn table_name(self) -> &'static str {
        match self {
            Self::PropertyBase => "AC_PROPERTY_BASE",
            Self::BudgetBase => "AC_BUDGET_BASE",
        }
    }

    pub fn carries_business_key(self) -> bool {
        matches!(self, Self::PropertyBase)
    }

    pub fn join_path(self) -> JoinPath {
        if self.carries_business_key() {
            JoinPath::Direct
        } else {
            JoinPath::ThroughPrimary
        }
    }
}

impl fmt::Display for TargetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Column type used when staging a diff table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    #[serde(rename = "varchar")]
    VarChar(u16),
    Float,
    Integer,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VarChar(len) => write!(f, "VARCHAR({len})"),
            Self::Float => f.write_str("FLOAT"),
            Self::Integer => f.write_str("INTEGER"),
        }
    }
}

/// Table a filter predicate reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateSource {
    /// The primary entity table.
    Primary,
    /// The user attribute table, joined on property number when referenced.
    User,
    /// The table being updated.
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    NotEq,
}

impl CompareOp {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
        }
    }
}

/// Extra condition ANDed into an update's filter.
///
/// Follows SQL comparison semantics: a null column value satisfies neither
/// `=` nor `<>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub source: PredicateSource,
    pub column: String,
    pub op: CompareOp,
    pub value: String,
}

impl FilterPredicate {
    pub fn new(
        source: PredicateSource,
        column: impl Into<String>,
        op: CompareOp,
        value: impl Into<String>,
    ) -> Self {
        Self {
            source,
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluate against a column value; `None` is SQL NULL.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (value, self.op) {
            (None, _) => false,
            (Some(value), CompareOp::Eq) => value == self.value,
            (Some(value), CompareOp::NotEq) => value != self.value,
        }
    }
}
