use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use wellsync_cli::pipeline::{
    CHANGES_DIR, CheckSummary, POST_UPDATE_DIR, Workspace, export_run, load_profile,
    select_checks, summarize, warn_pending, write_backups, write_ledger, write_script,
    write_summary,
};
use wellsync_core::{CheckRun, ReconcileSession, SqlScript};
use wellsync_model::{ComparisonKind, SyncProfile};

use crate::cli::{ProfileArgs, RunArgs, UpdateArgs};
use crate::summary::apply_table_style;
use crate::types::RunResult;

fn profile_from_args(args: &ProfileArgs) -> Result<SyncProfile> {
    load_profile(args.profile.as_deref(), &args.business_unit)
}

pub fn run_checks(args: &ProfileArgs) -> Result<()> {
    let profile = profile_from_args(args)?;
    let mut table = Table::new();
    table.set_header(vec![
        "Check", "Planning", "Ledger", "Compare", "Target", "Sets", "Condition",
    ]);
    apply_table_style(&mut table);
    for check in &profile.checks {
        let compare = match check.kind {
            ComparisonKind::Text => "text".to_string(),
            ComparisonKind::Numeric { precision } => format!("numeric ({precision})"),
        };
        let target = check
            .target
            .map_or_else(|| "-".to_string(), |target| target.to_string());
        let sets = if check.is_updatable() {
            check.set_column().to_string()
        } else {
            "-".to_string()
        };
        let condition = check.condition.as_ref().map_or_else(
            || "-".to_string(),
            |condition| {
                format!(
                    "{} {} '{}'",
                    condition.column,
                    condition.op.sql(),
                    condition.value
                )
            },
        );
        table.add_row(vec![
            check.name.clone(),
            check.planning.clone(),
            check.ledger.clone(),
            compare,
            target,
            sets,
            condition,
        ]);
    }
    println!("Business unit: {}", profile.business_unit);
    println!("{table}");
    Ok(())
}

pub fn run_profile(args: &ProfileArgs) -> Result<()> {
    let profile = profile_from_args(args)?;
    let text = toml::to_string_pretty(&profile).context("serialize profile")?;
    print!("{text}");
    Ok(())
}

struct Prepared {
    profile: SyncProfile,
    session: ReconcileSession,
    workspace: Workspace,
}

fn prepare(args: &RunArgs) -> Result<Prepared> {
    let mut profile = profile_from_args(&args.profile)?;
    select_checks(&mut profile, &args.only, &args.skip)?;
    let session = ReconcileSession::new(profile.clone())?;
    let business_unit = (!args.no_filter).then_some(profile.business_unit.as_str());
    let workspace = Workspace::load(&args.planning, &args.ledger, business_unit)?;
    Ok(Prepared {
        profile,
        session,
        workspace,
    })
}

fn result_for(args: &RunArgs, prepared: &Prepared, run: &CheckRun) -> RunResult {
    RunResult {
        business_unit: prepared.profile.business_unit.clone(),
        output_dir: args.output_dir.clone(),
        working_rows: run.joined.working.height(),
        planning_orphans: run.joined.in_planning_not_ledger.height(),
        ledger_orphans: run.joined.in_ledger_not_planning.height(),
        checks: summarize(run, &prepared.profile),
        updates: None,
        post_update: None,
        script: None,
        script_path: None,
        qc: false,
    }
}

/// Runs the checks and writes backups and per-check tables.
fn check_and_export(args: &RunArgs, prepared: &Prepared) -> Result<(CheckRun, RunResult)> {
    let output_dir = &args.output_dir;
    let run = prepared.workspace.run(&prepared.session)?;
    write_backups(
        output_dir,
        &prepared.workspace.planning,
        &prepared.workspace.ledger_frame()?,
    )?;
    let changes = output_dir.join(CHANGES_DIR);
    export_run(&changes, &run)?;
    let result = result_for(args, prepared, &run);
    write_summary(&changes, &prepared.profile, &run, &result.checks)?;
    Ok((run, result))
}

pub fn run_check(args: &RunArgs) -> Result<RunResult> {
    let span = info_span!("check", output_dir = %args.output_dir.display());
    let _guard = span.enter();
    let start = Instant::now();
    let prepared = prepare(args)?;
    let (_, result) = check_and_export(args, &prepared)?;
    info!(elapsed_ms = start.elapsed().as_millis(), "checks complete");
    Ok(result)
}

pub fn run_update(args: &UpdateArgs) -> Result<RunResult> {
    let span = info_span!(
        "update",
        output_dir = %args.run.output_dir.display(),
        dry_run = args.dry_run
    );
    let _guard = span.enter();
    let start = Instant::now();
    let mut prepared = prepare(&args.run)?;
    let (run, mut result) = check_and_export(&args.run, &prepared)?;

    if args.dry_run || args.sql_out.is_some() {
        let mut script = SqlScript::default();
        prepared.session.apply_updates(&run, &mut script)?;
        if let Some(path) = &args.sql_out {
            write_script(path, &script)?;
            result.script_path = Some(path.clone());
        }
        if args.dry_run {
            result.script = Some(script.to_script());
        }
    }
    if args.dry_run {
        info!(elapsed_ms = start.elapsed().as_millis(), "dry run complete");
        return Ok(result);
    }

    let report = prepared
        .session
        .apply_updates(&run, &mut prepared.workspace.ledger)?;
    write_ledger(&args.run.output_dir, &prepared.workspace)?;
    let post = qc_and_export(&args.run.output_dir, &prepared)?;
    warn_pending(&post);
    result.updates = Some(report);
    result.post_update = Some(post);
    info!(elapsed_ms = start.elapsed().as_millis(), "update complete");
    Ok(result)
}

fn qc_and_export(output_dir: &Path, prepared: &Prepared) -> Result<Vec<CheckSummary>> {
    let run = prepared.workspace.run(&prepared.session)?;
    let dir = output_dir.join(POST_UPDATE_DIR);
    export_run(&dir, &run)?;
    let checks = summarize(&run, &prepared.profile);
    write_summary(&dir, &prepared.profile, &run, &checks)?;
    Ok(checks)
}

pub fn run_qc(args: &RunArgs) -> Result<RunResult> {
    let span = info_span!("qc", output_dir = %args.output_dir.display());
    let _guard = span.enter();
    let prepared = prepare(args)?;
    let run = prepared.workspace.run(&prepared.session)?;
    let dir = args.output_dir.join(POST_UPDATE_DIR);
    export_run(&dir, &run)?;
    let mut result = result_for(args, &prepared, &run);
    write_summary(&dir, &prepared.profile, &run, &result.checks)?;
    warn_pending(&result.checks);
    result.qc = true;
    Ok(result)
}
