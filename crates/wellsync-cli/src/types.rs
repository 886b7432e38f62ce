use std::path::PathBuf;

use wellsync_cli::pipeline::CheckSummary;
use wellsync_core::UpdateReport;

#[derive(Debug)]
pub struct RunResult {
    pub business_unit: String,
    pub output_dir: PathBuf,
    pub working_rows: usize,
    pub planning_orphans: usize,
    pub ledger_orphans: usize,
    pub checks: Vec<CheckSummary>,
    pub updates: Option<UpdateReport>,
    /// Checks compared again after the update.
    pub post_update: Option<Vec<CheckSummary>>,
    /// T-SQL printed by a dry run.
    pub script: Option<String>,
    pub script_path: Option<PathBuf>,
    /// Highlight checks the ledger still disagrees with.
    pub qc: bool,
}
