//! Loading, running and exporting one reconciliation.
//!
//! The binary's commands are thin wrappers over these steps so the whole
//! flow can be exercised from tests against files on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};
use wellsync_core::{CheckRun, DiffTable, MemoryLedger, ReconcileSession, SqlScript};
use wellsync_ingest::{
    LedgerFilter, LedgerTables, PlanningFilter, read_frame, read_ledger_dir, write_frame,
    write_ledger_dir,
};
use wellsync_model::{MatchClass, SyncProfile, TargetTable};

pub const BACKUPS_DIR: &str = "backups";
pub const CHANGES_DIR: &str = "changes";
pub const LEDGER_DIR: &str = "ledger";
pub const POST_UPDATE_DIR: &str = "post_update";
pub const PLANNING_ORPHANS_FILE: &str = "in_planning_not_ledger.csv";
pub const LEDGER_ORPHANS_FILE: &str = "in_ledger_not_planning.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Loads a profile from TOML, or builds the standard one for the business
/// unit. The result is validated either way.
pub fn load_profile(path: Option<&Path>, business_unit: &str) -> Result<SyncProfile> {
    let profile = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("read profile {}", path.display()))?;
            let profile: SyncProfile = toml::from_str(&content)
                .with_context(|| format!("parse profile {}", path.display()))?;
            info!(path = %path.display(), checks = profile.checks.len(), "loaded profile");
            profile
        }
        None => SyncProfile::builtin(business_unit),
    };
    profile.validate().context("invalid profile")?;
    Ok(profile)
}

/// Applies `--only` and `--skip` selections.
pub fn select_checks(profile: &mut SyncProfile, only: &[String], skip: &[String]) -> Result<()> {
    if !only.is_empty() {
        profile.enable_only(only)?;
    }
    for name in skip {
        profile.set_enabled(name, false)?;
    }
    if profile.enabled_checks().next().is_none() {
        bail!("no checks enabled");
    }
    Ok(())
}

/// Planning extract and ledger tables for one run.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub planning: DataFrame,
    pub ledger: MemoryLedger,
    ledger_filter: Option<LedgerFilter>,
}

impl Workspace {
    /// Loads the planning CSV and the ledger directory. When `business_unit`
    /// is set both sides are narrowed with the standard source filters.
    pub fn load(planning: &Path, ledger_dir: &Path, business_unit: Option<&str>) -> Result<Self> {
        let mut planning = read_frame(planning)?;
        let tables = read_ledger_dir(ledger_dir)?;
        if let Some(business_unit) = business_unit {
            planning = PlanningFilter::new(business_unit).apply(&planning)?;
        }
        let mut ledger = MemoryLedger::new(tables.property, tables.budget);
        if let Some(user) = tables.user {
            ledger = ledger.with_user_table(user);
        }
        Ok(Self {
            planning,
            ledger,
            ledger_filter: business_unit.map(LedgerFilter::new),
        })
    }

    /// Property rows with their budget rows, narrowed to the business unit.
    pub fn ledger_frame(&self) -> Result<DataFrame> {
        let view = self.ledger.ledger_view()?;
        match &self.ledger_filter {
            Some(filter) => filter.apply(&view),
            None => Ok(view),
        }
    }

    pub fn run(&self, session: &ReconcileSession) -> Result<CheckRun> {
        let ledger = self.ledger_frame()?;
        Ok(session.run(&self.planning, &ledger)?)
    }

    pub fn ledger_tables(&self) -> LedgerTables {
        LedgerTables {
            property: self.ledger.table(TargetTable::PropertyBase).clone(),
            budget: self.ledger.table(TargetTable::BudgetBase).clone(),
            user: self.ledger.user_table().cloned(),
        }
    }
}

pub fn write_backups(output_dir: &Path, planning: &DataFrame, ledger: &DataFrame) -> Result<()> {
    let dir = output_dir.join(BACKUPS_DIR);
    write_frame(&dir.join("planning.csv"), planning)?;
    write_frame(&dir.join("ledger.csv"), ledger)?;
    Ok(())
}

pub fn write_ledger(output_dir: &Path, workspace: &Workspace) -> Result<PathBuf> {
    let dir = output_dir.join(LEDGER_DIR);
    write_ledger_dir(&dir, &workspace.ledger_tables())?;
    Ok(dir)
}

/// Writes both orphan reports and one CSV per diff table into `dir`.
/// Returns the number of files written.
pub fn export_run(dir: &Path, run: &CheckRun) -> Result<usize> {
    write_frame(
        &dir.join(PLANNING_ORPHANS_FILE),
        &run.joined.in_planning_not_ledger,
    )?;
    write_frame(
        &dir.join(LEDGER_ORPHANS_FILE),
        &run.joined.in_ledger_not_planning,
    )?;
    for diff in &run.diffs {
        write_frame(&dir.join(format!("{}.csv", diff.name)), &diff.data)?;
    }
    let written = run.diffs.len() + 2;
    info!(dir = %dir.display(), files = written, "exported check results");
    Ok(written)
}

pub fn write_script(path: &Path, script: &SqlScript) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, script.to_script())
        .with_context(|| format!("write script {}", path.display()))?;
    Ok(())
}

/// Per-check counts shown in the summary table and written to
/// `summary.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub name: String,
    pub planning: String,
    pub ledger: String,
    pub target: Option<TargetTable>,
    pub rows: usize,
    pub classes: BTreeMap<MatchClass, usize>,
    pub pending: usize,
}

impl CheckSummary {
    pub fn count(&self, class: MatchClass) -> usize {
        self.classes.get(&class).copied().unwrap_or(0)
    }

    /// Rows that still need a ledger update on an updatable check.
    pub fn needs_update(&self) -> bool {
        self.target.is_some() && self.pending > 0
    }
}

fn summarize_diff(diff: &DiffTable, profile: &SyncProfile) -> CheckSummary {
    CheckSummary {
        name: diff.name.clone(),
        planning: diff.planning_column.clone(),
        ledger: diff.ledger_column.clone(),
        target: profile.check(&diff.name).and_then(|check| check.target),
        rows: diff.height(),
        classes: diff.class_counts(),
        pending: diff.pending_updates(),
    }
}

pub fn summarize(run: &CheckRun, profile: &SyncProfile) -> Vec<CheckSummary> {
    run.diffs
        .iter()
        .map(|diff| summarize_diff(diff, profile))
        .collect()
}

#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    business_unit: &'a str,
    working_rows: usize,
    planning_orphans: usize,
    ledger_orphans: usize,
    checks: &'a [CheckSummary],
}

/// Writes the per-check counts as JSON next to the exported tables.
pub fn write_summary(
    dir: &Path,
    profile: &SyncProfile,
    run: &CheckRun,
    checks: &[CheckSummary],
) -> Result<()> {
    let summary = SummaryFile {
        business_unit: &profile.business_unit,
        working_rows: run.joined.working.height(),
        planning_orphans: run.joined.in_planning_not_ledger.height(),
        ledger_orphans: run.joined.in_ledger_not_planning.height(),
        checks,
    };
    fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    let path = dir.join(SUMMARY_FILE);
    let content = serde_json::to_string_pretty(&summary).context("serialize summary")?;
    fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Warns about checks the ledger still disagrees with.
pub fn warn_pending(checks: &[CheckSummary]) {
    for check in checks.iter().filter(|check| check.needs_update()) {
        warn!(check = %check.name, pending = check.pending, "ledger still differs from planning");
    }
}
