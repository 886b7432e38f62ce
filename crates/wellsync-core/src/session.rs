//! One reconciliation run driven by a [`SyncProfile`].

use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};
use wellsync_model::{ComparisonKind, FieldCheck, SyncProfile, TargetTable};

use crate::compare::{DiffLayout, DiffTable, compare_columns, compare_numeric_columns};
use crate::error::Result;
use crate::join::{JoinSpec, JoinedDatasets, join_datasets};
use crate::selector::with_derived_columns;
use crate::update::{LedgerStore, TypeHints, UpdateOutcome, update_table};

/// Runs checks and updates for one validated profile.
#[derive(Debug, Clone)]
pub struct ReconcileSession {
    profile: SyncProfile,
    layout: DiffLayout,
}

impl ReconcileSession {
    pub fn new(profile: SyncProfile) -> Result<Self> {
        profile.validate()?;
        let layout = DiffLayout::new(&profile.ledger_key, &profile.lease_column);
        Ok(Self { profile, layout })
    }

    pub fn profile(&self) -> &SyncProfile {
        &self.profile
    }

    /// Joins both datasets and adds the profile's derived columns to the
    /// working set.
    pub fn join(&self, planning: &DataFrame, ledger: &DataFrame) -> Result<JoinedDatasets> {
        let mut joined = join_datasets(planning, ledger, &JoinSpec::from(&self.profile))?;
        joined.working = with_derived_columns(joined.working, &self.profile.derived)?;
        Ok(joined)
    }

    /// Runs a single check over the working set.
    pub fn compare(&self, check: &FieldCheck, working: &DataFrame) -> Result<DiffTable> {
        let labels = check.labels();
        let diff = match check.kind {
            ComparisonKind::Text => {
                compare_columns(&check.planning, &check.ledger, working, &labels, &self.layout)?
            }
            ComparisonKind::Numeric { precision } => compare_numeric_columns(
                &check.planning,
                &check.ledger,
                working,
                precision,
                &labels,
                &self.layout,
            )?,
        };
        Ok(diff.named(&check.name))
    }

    /// Joins and runs every enabled check.
    pub fn run(&self, planning: &DataFrame, ledger: &DataFrame) -> Result<CheckRun> {
        let joined = self.join(planning, ledger)?;
        let mut diffs = Vec::new();
        for check in self.profile.enabled_checks() {
            let span = info_span!("check", name = %check.name);
            let _guard = span.enter();
            let diff = self.compare(check, &joined.working)?;
            info!(
                rows = diff.height(),
                pending = diff.pending_updates(),
                "check complete"
            );
            diffs.push(diff);
        }
        Ok(CheckRun { joined, diffs })
    }

    /// Pushes every pending update of `run` into `store`.
    ///
    /// Report-only checks and checks with nothing pending are skipped.
    pub fn apply_updates<S: LedgerStore + ?Sized>(
        &self,
        run: &CheckRun,
        store: &mut S,
    ) -> Result<UpdateReport> {
        let mut report = UpdateReport::default();
        for diff in &run.diffs {
            let target = self.profile.check(&diff.name).and_then(|check| {
                check
                    .target
                    .zip(check.staging_type)
                    .map(|(target, staging_type)| (check, target, staging_type))
            });
            let Some((check, target, staging_type)) = target else {
                debug!(check = %diff.name, "report-only check, not updating");
                report.skipped.push((diff.name.clone(), SkipReason::ReportOnly));
                continue;
            };
            if diff.pending_updates() == 0 {
                debug!(check = %diff.name, "ledger already up to date");
                report.skipped.push((diff.name.clone(), SkipReason::UpToDate));
                continue;
            }

            let mut hints = TypeHints::new();
            hints.insert(self.profile.ledger_key.clone(), self.profile.key_type);
            hints.insert(check.planning.clone(), staging_type);
            let outcome = update_table(
                &mut *store,
                target,
                diff,
                &check.planning,
                check.set_column(),
                &hints,
                check.condition.as_ref(),
            )?;
            report.applied.push(AppliedUpdate {
                check: check.name.clone(),
                target,
                column: check.set_column().to_string(),
                outcome,
            });
        }
        Ok(report)
    }
}

/// Output of [`ReconcileSession::run`].
#[derive(Debug, Clone)]
pub struct CheckRun {
    pub joined: JoinedDatasets,
    /// One diff table per enabled check, in profile order.
    pub diffs: Vec<DiffTable>,
}

impl CheckRun {
    pub fn diff(&self, name: &str) -> Option<&DiffTable> {
        self.diffs
            .iter()
            .find(|diff| diff.name.eq_ignore_ascii_case(name))
    }

    pub fn pending_updates(&self) -> usize {
        self.diffs.iter().map(DiffTable::pending_updates).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The check has no target table.
    ReportOnly,
    /// No row needs an update.
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub check: String,
    pub target: TargetTable,
    pub column: String,
    pub outcome: UpdateOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub applied: Vec<AppliedUpdate>,
    pub skipped: Vec<(String, SkipReason)>,
}
