//! Match classification for one compared field.

use serde::{Deserialize, Serialize};

/// Outcome of comparing a planning value with a ledger value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchClass {
    /// Both present and equal.
    Match,
    /// Both present and different; the ledger should take the planning value.
    Mismatch,
    /// Planning has a value, the ledger does not.
    LedgerMissing,
    /// The ledger has a value, planning does not.
    PlanningMissing,
    /// Neither side has a value.
    BothMissing,
}

impl MatchClass {
    pub const ALL: [Self; 5] = [
        Self::Match,
        Self::Mismatch,
        Self::LedgerMissing,
        Self::PlanningMissing,
        Self::BothMissing,
    ];

    /// Classify from presence flags, calling `equal` only when both sides
    /// are present.
    pub fn from_presence(
        planning_present: bool,
        ledger_present: bool,
        equal: impl FnOnce() -> bool,
    ) -> Self {
        match (planning_present, ledger_present) {
            (false, false) => Self::BothMissing,
            (true, false) => Self::LedgerMissing,
            (false, true) => Self::PlanningMissing,
            (true, true) if equal() => Self::Match,
            (true, true) => Self::Mismatch,
        }
    }

    /// True when the ledger row should be overwritten with the planning value.
    pub fn needs_ledger_update(self) -> bool {
        matches!(self, Self::Mismatch | Self::LedgerMissing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::LedgerMissing => "ledger_missing",
            Self::PlanningMissing => "planning_missing",
            Self::BothMissing => "both_missing",
        }
    }
}

/// The five caller-supplied labels written into a diff table's `MATCH`
/// column, one per [`MatchClass`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLabels {
    pub matched: String,
    pub mismatch: String,
    pub ledger_missing: String,
    pub planning_missing: String,
    pub both_missing: String,
}

impl MatchLabels {
    /// Labels used by textual comparisons.
    pub fn textual() -> Self {
        Self {
            matched: "MATCH".to_string(),
            mismatch: "UPDATE ARIES".to_string(),
            ledger_missing: "UPDATE ARIES".to_string(),
            planning_missing: "UPDATE DEVPLANNING".to_string(),
            both_missing: "NOT ASSIGNED".to_string(),
        }
    }

    /// Labels used by numeric comparisons, where an empty planning value is
    /// reported separately from an outdated ledger.
    pub fn numeric() -> Self {
        Self {
            matched: "MATCH".to_string(),
            mismatch: "UPDATE ARIES".to_string(),
            ledger_missing: "UPDATE ARIES".to_string(),
            planning_missing: "DP EMPTY".to_string(),
            both_missing: "BOTH VALUES NULL".to_string(),
        }
    }

    pub fn new(
        matched: impl Into<String>,
        mismatch: impl Into<String>,
        ledger_missing: impl Into<String>,
        planning_missing: impl Into<String>,
        both_missing: impl Into<String>,
    ) -> Self {
        Self {
            matched: matched.into(),
            mismatch: mismatch.into(),
            ledger_missing: ledger_missing.into(),
            planning_missing: planning_missing.into(),
            both_missing: both_missing.into(),
        }
    }

    pub fn label(&self, class: MatchClass) -> &str {
        match class {
            MatchClass::Match => &self.matched,
            MatchClass::Mismatch => &self.mismatch,
            MatchClass::LedgerMissing => &self.ledger_missing,
            MatchClass::PlanningMissing => &self.planning_missing,
            MatchClass::BothMissing => &self.both_missing,
        }
    }
}

impl Default for MatchLabels {
    fn default() -> Self {
        Self::textual()
    }
}
