mod models;
mod service;
mod utils;

use crate::models::error::RotateError;
use crate::models::retention::RetentionThresholds;
use crate::models::run_mode::RunMode;
use crate::service::planner::plan_next;
use crate::service::report::RunReport;
use crate::service::retention::compute_deletions;
use crate::service::snapshot;
use crate::utils::directory;
use anyhow::{Context, Result};
use chrono::{Duration, Local};
use clap::Parser;
use log::{debug, error, info};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "snaprotate")]
#[command(about = "Rotates full and differential drive snapshot backups", long_about = None)]
struct Cli {
    /// Directory containing the backup files
    backup_dir: PathBuf,

    /// Drive to back up, e.g. C:
    drive: String,

    /// Path of the snapshot binary
    #[arg(long = "cmd", default_value = "snapshot.exe", env = "SNAPROTATE_CMD")]
    cmd: PathBuf,

    /// Create X differential backups after every full backup. 0 = only full backups
    #[arg(long = "diffcount", default_value_t = 0, value_name = "X")]
    diff_count: u32,

    /// Exclude the given files or folders
    #[arg(long = "exclude", value_name = "PATH", num_args = 1..)]
    exclude: Vec<String>,

    /// Read additional snapshot arguments from this file instead of the defaults
    #[arg(short = 'a', long = "argsfile", value_name = "ARGS_FILE")]
    args_file: Option<PathBuf>,

    /// Compute plan and cleanup without calling snapshot or deleting any file
    #[arg(long = "simulate")]
    simulate: bool,

    /// Delete all backups older than DAYS days. Full backups are kept while
    /// any differential backup depending on them is kept
    #[arg(short = 'd', long = "delete", value_name = "DAYS")]
    delete: Option<i64>,

    /// Delete differential backups older than DAYS days
    #[arg(long = "deletediff", value_name = "DAYS")]
    delete_diff: Option<i64>,

    /// Machine name used in backup file names; defaults to the host name
    #[arg(long = "machine", env = "SNAPROTATE_MACHINE")]
    machine: Option<String>,

    #[arg(short = 'l', long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();

    let mode = if args.simulate {
        RunMode::Simulate
    } else {
        RunMode::Real
    };
    let mut report = RunReport::new(mode);

    // Failures are captured into the report so the summary still goes out.
    let result = run(&args, mode, &mut report);
    if let Err(err) = &result {
        error!("{:#}", err);
        report.failure = Some(format!("{:#}", err));
    }

    println!("{}", report.subject());
    println!();
    println!("{}", report.compose());
    info!("Finished");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn run(args: &Cli, mode: RunMode, report: &mut RunReport) -> Result<()> {
    let machine = match &args.machine {
        Some(machine) => machine.to_lowercase(),
        None => hostname::get()
            .context("Failed to determine the host name")?
            .to_string_lossy()
            .to_lowercase(),
    };
    let mut drive = args.drive.to_lowercase();
    if let Some(stripped) = drive.strip_suffix(':') {
        drive = stripped.to_string();
    }

    report.machine = Some(machine.clone());
    report.drive = Some(drive.clone());

    do_backup(args, mode, &machine, &drive, report)?;
    do_cleanup(args, mode, &machine, &drive, report)?;
    Ok(())
}

/// Plan the next backup in the chain and have the snapshot tool produce it.
fn do_backup(
    args: &Cli,
    mode: RunMode,
    machine: &str,
    drive: &str,
    report: &mut RunReport,
) -> Result<()> {
    if !args.cmd.is_file() {
        return Err(RotateError::ExecutableNotFound {
            path: args.cmd.clone(),
        }
        .into());
    }
    if args.backup_dir.is_file() {
        return Err(RotateError::NotADirectory {
            path: args.backup_dir.clone(),
        }
        .into());
    }

    let extra_args: Vec<String> = match &args.args_file {
        Some(path) => snapshot::read_snapshot_args(path)?,
        None => snapshot::DEFAULT_SNAPSHOT_ARGS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };

    if !args.backup_dir.is_dir() {
        fs::create_dir_all(&args.backup_dir).with_context(|| {
            format!(
                "Failed to create backup directory '{}'",
                args.backup_dir.display()
            )
        })?;
    }

    let (records, failures) = directory::scan_records(&args.backup_dir, machine, drive)?;
    report.record_scan_failures(&failures);
    debug!("Found {} existing backup record(s)", records.len());

    let now = Local::now().naive_local();
    let plan = plan_next(&records, args.diff_count, machine, drive, now, |index| {
        args.backup_dir.join(index).is_file()
    })?;

    if let Some(index) = &plan.reference_index {
        info!("Performing differential backup based on index file {}", index);
    }

    let backup_path = args.backup_dir.join(&plan.file_name);
    report.backup_path = Some(backup_path.display().to_string());
    report.plan = Some(plan.clone());

    let outcome = snapshot::run_snapshot(
        &args.cmd,
        drive,
        &backup_path,
        &extra_args,
        &plan,
        &args.backup_dir,
        &args.exclude,
        mode,
    )?;
    report.command_line = Some(outcome.command_line);
    report.exit_code = Some(outcome.exit_code);
    report.log_text = Some(outcome.log_text);

    if outcome.exit_code != 0 {
        return Err(RotateError::SnapshotFailed {
            code: outcome.exit_code,
        }
        .into());
    }
    Ok(())
}

/// Sweep aged backups according to the retention thresholds and delete their
/// artifact files.
fn do_cleanup(
    args: &Cli,
    mode: RunMode,
    machine: &str,
    drive: &str,
    report: &mut RunReport,
) -> Result<()> {
    let thresholds = RetentionThresholds {
        diff_max_age_days: args.delete_diff,
        all_max_age_days: args.delete,
    };
    if thresholds.is_unset() {
        return Ok(());
    }

    let (records, failures) = directory::scan_records(&args.backup_dir, machine, drive)?;
    report.record_scan_failures(&failures);

    let now = Local::now().naive_local();
    report.delete_cutoff_diff = thresholds.diff_max_age_days.map(|d| now - Duration::days(d));
    report.delete_cutoff_all = thresholds.all_max_age_days.map(|d| now - Duration::days(d));

    let doomed = compute_deletions(&records, now, &thresholds);
    let deleted = directory::delete_backup_files(&args.backup_dir, &doomed, mode)?;
    report.deleted_files = deleted.iter().map(|p| p.display().to_string()).collect();
    Ok(())
}
