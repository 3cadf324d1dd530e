use crate::models::error::{Result, RotateError};
use crate::models::plan::BackupPlan;
use crate::models::run_mode::RunMode;
use log::info;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::Builder;

/// Default snapshot arguments, used when --argsfile is not given.
/// --CreateDir: create the destination directory if it does not exist.
pub const DEFAULT_SNAPSHOT_ARGS: &[&str] = &["--CreateDir", "--AutoBackupSize:512", "-L0", "-Gx"];

/// Arguments the runner composes itself; an args file must not override them.
const RESERVED_ARGS: &[&str] = &["-W", "--LogFile", "-h"];

/// Result of one snapshot tool invocation.
#[derive(Debug)]
pub struct SnapshotOutcome {
    pub command_line: String,
    pub exit_code: i32,
    pub log_text: String,
}

/// Read extra snapshot arguments from an args file. Tokens are separated by
/// whitespace; tokens that start with a reserved argument are rejected.
pub fn read_snapshot_args(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(RotateError::ArgsFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let text = fs::read_to_string(path)?;
    let args: Vec<String> = text.split_whitespace().map(str::to_string).collect();

    for arg in &args {
        for reserved in RESERVED_ARGS {
            if arg.to_lowercase().starts_with(&reserved.to_lowercase()) {
                return Err(RotateError::ReservedArgument {
                    arg: arg.clone(),
                    path: path.to_path_buf(),
                });
            }
        }
    }

    Ok(args)
}

/// Compose the snapshot command line for the given plan.
///
/// Shape: `<cmd> <drive>: <backup_file> -W <extra args> [-h<index>]
/// [--exclude:<list>] --LogFile:<log>`. A differential plan references the
/// anchoring full backup's index file through `-h`.
pub fn build_command(
    cmd: &Path,
    drive: &str,
    backup_path: &Path,
    extra_args: &[String],
    plan: &BackupPlan,
    backup_dir: &Path,
    excludes: &[String],
    log_file: &Path,
) -> Vec<String> {
    let mut argv = vec![
        cmd.display().to_string(),
        format!("{}:", drive),
        backup_path.display().to_string(),
        "-W".to_string(),
    ];
    argv.extend(extra_args.iter().cloned());

    if let Some(index) = &plan.reference_index {
        argv.push(format!("-h{}", backup_dir.join(index).display()));
    }

    if !excludes.is_empty() {
        // Entries containing '@' have meaning to the snapshot tool and must
        // be quoted inside the exclude list.
        let joined = excludes
            .iter()
            .map(|e| {
                if e.contains('@') {
                    format!("\"{}\"", e)
                } else {
                    e.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        argv.push(format!("--exclude:{}", joined));
    }

    argv.push(format!("--LogFile:{}", log_file.display()));
    argv
}

/// Invoke the snapshot executable for the given plan and capture its log.
///
/// The tool logs to a temporary file which is read back and removed when the
/// invocation is done. In simulate mode the command line is composed and
/// reported but nothing is executed.
pub fn run_snapshot(
    cmd: &Path,
    drive: &str,
    backup_path: &Path,
    extra_args: &[String],
    plan: &BackupPlan,
    backup_dir: &Path,
    excludes: &[String],
    mode: RunMode,
) -> Result<SnapshotOutcome> {
    let log_file = Builder::new().prefix("snaprotate").suffix(".log").tempfile()?;

    let argv = build_command(
        cmd,
        drive,
        backup_path,
        extra_args,
        plan,
        backup_dir,
        excludes,
        log_file.path(),
    );
    let command_line = argv.join(" ");
    info!("Executing: {}", command_line);

    let exit_code = if mode.should_run_snapshot() {
        let status = Command::new(&argv[0]).args(&argv[1..]).status()?;
        status.code().unwrap_or(-1)
    } else {
        0
    };

    let log_text = fs::read_to_string(log_file.path()).unwrap_or_default();

    Ok(SnapshotOutcome {
        command_line,
        exit_code,
        log_text,
    })
}
