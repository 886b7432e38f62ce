//! Source filters applied before reconciliation.

use anyhow::{Result, bail};
use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};
use serde::{Deserialize, Serialize};
use tracing::info;
use wellsync_common::{column_values, has_column};

pub const BUSINESS_UNIT_COLUMN: &str = "BUSINESS_UNIT";
pub const SCENARIO_COLUMN: &str = "SCENARIO";
pub const DEV_STATUS_COLUMN: &str = "DEV_STATUS";
pub const RESERVE_CATEGORY_COLUMN: &str = "RSV_CAT";

/// Keeps rows whose column value is in `allowed`; nulls never pass.
fn keep_in(
    df: &DataFrame,
    column: &str,
    allowed: &[String],
    case_insensitive: bool,
) -> Result<Vec<bool>> {
    if !has_column(df, column) {
        bail!("missing column {column}");
    }
    Ok(column_values(df, column)?
        .iter()
        .map(|value| {
            value.as_text().is_some_and(|text| {
                let text = text.trim();
                allowed.iter().any(|allowed| {
                    if case_insensitive {
                        allowed.eq_ignore_ascii_case(text)
                    } else {
                        allowed == text
                    }
                })
            })
        })
        .collect())
}

fn apply_masks(df: &DataFrame, masks: &[Vec<bool>]) -> Result<DataFrame> {
    let keep: Vec<bool> = (0..df.height())
        .map(|row| masks.iter().all(|mask| mask[row]))
        .collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

/// Planning rows in scope: one business unit, active scenarios, and
/// development statuses that are expected in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningFilter {
    pub business_unit: String,
    pub scenarios: Vec<String>,
    pub dev_statuses: Vec<String>,
}

impl PlanningFilter {
    pub fn new(business_unit: &str) -> Self {
        Self {
            business_unit: business_unit.trim().to_uppercase(),
            scenarios: vec!["A".to_string(), "MDV".to_string()],
            dev_statuses: vec!["PRIMARY".to_string(), "DEVELOPMENT".to_string()],
        }
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let masks = [
            keep_in(
                df,
                BUSINESS_UNIT_COLUMN,
                std::slice::from_ref(&self.business_unit),
                true,
            )?,
            keep_in(df, SCENARIO_COLUMN, &self.scenarios, false)?,
            keep_in(df, DEV_STATUS_COLUMN, &self.dev_statuses, false)?,
        ];
        let filtered = apply_masks(df, &masks)?;
        info!(
            business_unit = %self.business_unit,
            rows_in = df.height(),
            rows_out = filtered.height(),
            "filtered planning rows"
        );
        Ok(filtered)
    }
}

/// Ledger rows in scope: one business unit and the undeveloped reserve
/// categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub business_unit: String,
    pub reserve_categories: Vec<String>,
}

impl LedgerFilter {
    pub fn new(business_unit: &str) -> Self {
        Self {
            business_unit: business_unit.trim().to_uppercase(),
            reserve_categories: ["5PUD", "5PUDX", "6PROB", "7POSS"]
                .iter()
                .map(|category| (*category).to_string())
                .collect(),
        }
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let masks = [
            keep_in(
                df,
                BUSINESS_UNIT_COLUMN,
                std::slice::from_ref(&self.business_unit),
                true,
            )?,
            keep_in(df, RESERVE_CATEGORY_COLUMN, &self.reserve_categories, false)?,
        ];
        let filtered = apply_masks(df, &masks)?;
        info!(
            business_unit = %self.business_unit,
            rows_in = df.height(),
            rows_out = filtered.height(),
            "filtered ledger rows"
        );
        Ok(filtered)
    }
}
