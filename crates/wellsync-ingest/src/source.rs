//! CSV extracts of the planning warehouse and the ledger tables.
//!
//! Every column is read as a string so identifiers with leading zeros
//! (`000123`) survive. Comparators coerce on demand.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::{CsvReadOptions, CsvWriter, DataFrame, SerReader, SerWriter};
use tracing::{debug, info};

/// Ledger table file names inside a ledger directory.
pub const PROPERTY_FILE: &str = "AC_PROPERTY.csv";
pub const BUDGET_FILE: &str = "AC_BUDGET.csv";
pub const USER_FILE: &str = "AC_USER.csv";

/// Reads a CSV file with a header row. Empty cells are null.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to read CSV: {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read frame");
    Ok(df)
}

/// Writes a frame as CSV with a header row, creating parent directories.
pub fn write_frame(path: &Path, df: &DataFrame) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("create file {}", path.display()))?;
    let mut df = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("write CSV {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), "wrote frame");
    Ok(())
}

/// The ledger tables a reconciliation reads and updates.
#[derive(Debug, Clone)]
pub struct LedgerTables {
    pub property: DataFrame,
    pub budget: DataFrame,
    /// User attribute table; only needed by conditional updates.
    pub user: Option<DataFrame>,
}

/// Loads `AC_PROPERTY.csv`, `AC_BUDGET.csv` and, when present, `AC_USER.csv`.
pub fn read_ledger_dir(dir: &Path) -> Result<LedgerTables> {
    let property = read_frame(&dir.join(PROPERTY_FILE))?;
    let budget = read_frame(&dir.join(BUDGET_FILE))?;
    let user_path = dir.join(USER_FILE);
    let user = if user_path.is_file() {
        Some(read_frame(&user_path)?)
    } else {
        None
    };
    info!(
        dir = %dir.display(),
        property_rows = property.height(),
        budget_rows = budget.height(),
        user_table = user.is_some(),
        "loaded ledger tables"
    );
    Ok(LedgerTables {
        property,
        budget,
        user,
    })
}

/// Writes the ledger tables back out under their standard file names.
pub fn write_ledger_dir(dir: &Path, tables: &LedgerTables) -> Result<()> {
    write_frame(&dir.join(PROPERTY_FILE), &tables.property)?;
    write_frame(&dir.join(BUDGET_FILE), &tables.budget)?;
    if let Some(user) = &tables.user {
        write_frame(&dir.join(USER_FILE), user)?;
    }
    Ok(())
}
