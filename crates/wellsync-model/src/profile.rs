//! Sync profile: which field pairs to compare and how to push them back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::classification::MatchLabels;
use crate::error::{ProfileError, Result};
use crate::target::{FilterPredicate, SqlType, TargetTable};

/// How the two sides of a field pair are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComparisonKind {
    /// Exact value equality.
    Text,
    /// Numeric coercion, delta rounded to `precision` decimal digits.
    /// Zero is treated as an absent value.
    Numeric { precision: i32 },
}

/// Scalar type a derived column is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Integer,
    Float,
    Text,
}

/// Column computed on the joined dataset from two candidates, first present
/// value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedColumn {
    pub name: String,
    pub primary: String,
    pub secondary: String,
    pub kind: ScalarKind,
}

impl DerivedColumn {
    pub fn new(
        name: impl Into<String>,
        primary: impl Into<String>,
        secondary: impl Into<String>,
        kind: ScalarKind,
    ) -> Self {
        Self {
            name: name.into(),
            primary: primary.into(),
            secondary: secondary.into(),
            kind,
        }
    }
}

fn enabled_default() -> bool {
    true
}

/// One field pair to compare, and optionally to push into the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    /// Short name, also used for the exported file.
    pub name: String,
    /// Planning-side column in the joined dataset.
    pub planning: String,
    /// Ledger-side column in the joined dataset.
    pub ledger: String,
    pub kind: ComparisonKind,
    /// Ledger table to update. Report-only checks leave this unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetTable>,
    /// Physical ledger column to set, when it differs from `ledger`
    /// (suffixed or derived columns).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_type: Option<SqlType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<FilterPredicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<MatchLabels>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

impl FieldCheck {
    pub fn text(
        name: impl Into<String>,
        planning: impl Into<String>,
        ledger: impl Into<String>,
    ) -> Self {
        Self::new(name, planning, ledger, ComparisonKind::Text)
    }

    pub fn numeric(
        name: impl Into<String>,
        planning: impl Into<String>,
        ledger: impl Into<String>,
        precision: i32,
    ) -> Self {
        Self::new(name, planning, ledger, ComparisonKind::Numeric { precision })
    }

    fn new(
        name: impl Into<String>,
        planning: impl Into<String>,
        ledger: impl Into<String>,
        kind: ComparisonKind,
    ) -> Self {
        Self {
            name: name.into(),
            planning: planning.into(),
            ledger: ledger.into(),
            kind,
            target: None,
            update_column: None,
            staging_type: None,
            condition: None,
            labels: None,
            enabled: true,
        }
    }

    /// Make the check updatable against `target`, staging the planning
    /// value as `staging_type`.
    #[must_use]
    pub fn updates(mut self, target: TargetTable, staging_type: SqlType) -> Self {
        self.target = Some(target);
        self.staging_type = Some(staging_type);
        self
    }

    #[must_use]
    pub fn setting(mut self, column: impl Into<String>) -> Self {
        self.update_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn when(mut self, condition: FilterPredicate) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_labels(mut self, labels: MatchLabels) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn is_updatable(&self) -> bool {
        self.target.is_some()
    }

    /// Ledger column written by an update.
    pub fn set_column(&self) -> &str {
        self.update_column.as_deref().unwrap_or(&self.ledger)
    }

    /// Labels for the diff table, falling back to the comparison's defaults.
    pub fn labels(&self) -> MatchLabels {
        match (&self.labels, self.kind) {
            (Some(labels), _) => labels.clone(),
            (None, ComparisonKind::Text) => MatchLabels::textual(),
            (None, ComparisonKind::Numeric { .. }) => MatchLabels::numeric(),
        }
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [("planning", &self.planning), ("ledger", &self.ledger)] {
            if value.trim().is_empty() {
                return Err(ProfileError::EmptyColumn {
                    check: self.name.clone(),
                    field,
                });
            }
        }
        if let ComparisonKind::Numeric { precision } = self.kind {
            if !(-10..=10).contains(&precision) {
                return Err(ProfileError::PrecisionOutOfRange {
                    check: self.name.clone(),
                    precision,
                });
            }
        }
        if self.target.is_some() && self.staging_type.is_none() {
            return Err(ProfileError::MissingStagingType(self.name.clone()));
        }
        Ok(())
    }
}

/// Everything one reconciliation run needs to know, passed explicitly into
/// the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProfile {
    pub business_unit: String,
    /// Business key column in the planning dataset.
    pub planning_key: String,
    /// Business key column in the ledger dataset.
    pub ledger_key: String,
    /// Human lease label carried into every diff table.
    pub lease_column: String,
    pub planning_suffix: String,
    pub ledger_suffix: String,
    /// Staging type of the business key column.
    pub key_type: SqlType,
    /// Columns reported for planning rows with no ledger match.
    pub planning_orphan_columns: Vec<String>,
    /// Columns reported for ledger rows with no planning match.
    pub ledger_orphan_columns: Vec<String>,
    #[serde(default)]
    pub derived: Vec<DerivedColumn>,
    #[serde(default)]
    pub checks: Vec<FieldCheck>,
}

impl SyncProfile {
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for check in &self.checks {
            if !seen.insert(check.name.to_uppercase()) {
                return Err(ProfileError::DuplicateCheck(check.name.clone()));
            }
            check.validate()?;
        }
        if self.planning_key.trim().is_empty() || self.ledger_key.trim().is_empty() {
            return Err(ProfileError::Message("key columns must be set".to_string()));
        }
        Ok(())
    }

    pub fn check(&self, name: &str) -> Option<&FieldCheck> {
        self.checks
            .iter()
            .find(|check| check.name.eq_ignore_ascii_case(name))
    }

    pub fn enabled_checks(&self) -> impl Iterator<Item = &FieldCheck> {
        self.checks.iter().filter(|check| check.enabled)
    }

    /// Enable or disable one check by name (case-insensitive).
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let check = self
            .checks
            .iter_mut()
            .find(|check| check.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ProfileError::UnknownCheck(name.to_string()))?;
        check.enabled = enabled;
        Ok(())
    }

    /// Enable exactly the named checks and disable the rest.
    pub fn enable_only<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            if self.check(name.as_ref()).is_none() {
                return Err(ProfileError::UnknownCheck(name.as_ref().to_string()));
            }
        }
        for check in &mut self.checks {
            check.enabled = names
                .iter()
                .any(|name| check.name.eq_ignore_ascii_case(name.as_ref()));
        }
        Ok(())
    }
}
