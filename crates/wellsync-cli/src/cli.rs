//! CLI argument definitions for wellsync.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "wellsync",
    version,
    about = "Reconcile development-planning well records with the Aries ledger",
    long_about = "Compare planning well records with the Aries ledger field by field.\n\n\
                  Writes backups, per-check diff tables and orphan reports, and can push\n\
                  planning values into the ledger tables for rows that differ."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the field checks of a profile.
    Checks(ProfileArgs),

    /// Print a profile as TOML.
    Profile(ProfileArgs),

    /// Compare planning with the ledger and export the results.
    Check(RunArgs),

    /// Compare, then push planning values into the ledger tables.
    Update(UpdateArgs),

    /// Re-run the checks after an update and flag what still differs.
    Qc(RunArgs),
}

#[derive(Args)]
pub struct ProfileArgs {
    /// Business unit the built-in profile is generated for.
    #[arg(long = "business-unit", short = 'b', default_value = "SOUTH TEXAS")]
    pub business_unit: String,

    /// Load the profile from a TOML file instead of the built-in one.
    #[arg(long = "profile", value_name = "FILE")]
    pub profile: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Planning extract (CSV).
    #[arg(long = "planning", value_name = "CSV")]
    pub planning: PathBuf,

    /// Directory holding AC_PROPERTY.csv, AC_BUDGET.csv and optionally AC_USER.csv.
    #[arg(long = "ledger", value_name = "DIR")]
    pub ledger: PathBuf,

    /// Output directory for backups and check results.
    #[arg(
        long = "output-dir",
        short = 'o',
        value_name = "DIR",
        default_value = "wellsync-output"
    )]
    pub output_dir: PathBuf,

    /// Run only the named check (repeatable).
    #[arg(long = "only", value_name = "CHECK")]
    pub only: Vec<String>,

    /// Skip the named check (repeatable).
    #[arg(long = "skip", value_name = "CHECK")]
    pub skip: Vec<String>,

    /// Use the extracts as given, without business unit and status filters.
    #[arg(long = "no-filter")]
    pub no_filter: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Print the T-SQL that would run instead of updating the ledger tables.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Also write the T-SQL script to this file.
    #[arg(long = "sql-out", value_name = "FILE")]
    pub sql_out: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
