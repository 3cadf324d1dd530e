use crate::models::error::RotateError;
use crate::models::plan::BackupPlan;
use crate::models::run_mode::RunMode;
use chrono::NaiveDateTime;
use std::fmt::Write;

/// Everything one run wants to tell the operator, collected while the run
/// progresses and rendered once at the end. The rendered text is the
/// notifier payload; how it gets delivered is up to the caller.
#[derive(Debug)]
pub struct RunReport {
    mode: RunMode,
    pub machine: Option<String>,
    pub drive: Option<String>,
    pub plan: Option<BackupPlan>,
    pub backup_path: Option<String>,
    pub command_line: Option<String>,
    pub exit_code: Option<i32>,
    pub log_text: Option<String>,
    pub delete_cutoff_all: Option<NaiveDateTime>,
    pub delete_cutoff_diff: Option<NaiveDateTime>,
    pub deleted_files: Vec<String>,
    pub scan_errors: Vec<String>,
    pub failure: Option<String>,
}

impl RunReport {
    pub fn new(mode: RunMode) -> Self {
        RunReport {
            mode,
            machine: None,
            drive: None,
            plan: None,
            backup_path: None,
            command_line: None,
            exit_code: None,
            log_text: None,
            delete_cutoff_all: None,
            delete_cutoff_diff: None,
            deleted_files: Vec::new(),
            scan_errors: Vec::new(),
            failure: None,
        }
    }

    /// Record per-file parse failures from a directory scan. The backup and
    /// cleanup steps scan the same directory, so repeats are dropped.
    pub fn record_scan_failures(&mut self, failures: &[RotateError]) {
        for failure in failures {
            let message = failure.to_string();
            if !self.scan_errors.contains(&message) {
                self.scan_errors.push(message);
            }
        }
    }

    /// One-line status, usable as a mail subject.
    pub fn subject(&self) -> String {
        format!(
            "{}Snapshot of {} drive {} {}",
            self.mode.subject_prefix(),
            self.machine.as_deref().unwrap_or("?"),
            self.drive.as_deref().unwrap_or("?"),
            if self.failure.is_some() {
                "FAILED"
            } else {
                "SUCCESSFUL"
            }
        )
    }

    /// Render the full summary body.
    pub fn compose(&self) -> String {
        let mut body = String::new();

        if self.mode.is_simulate() {
            body.push_str("Simulation:     YES\n");
        }
        if let Some(machine) = &self.machine {
            let _ = writeln!(body, "Machine:        {}", machine);
        }
        if let Some(drive) = &self.drive {
            let _ = writeln!(body, "Drive:          {}", drive);
        }
        if let Some(plan) = &self.plan {
            let _ = writeln!(body, "Backup Type:    {}", plan.kind);
            let _ = writeln!(body, "Backup Number:  {}", plan.chain_id);
        }
        if let Some(path) = &self.backup_path {
            let _ = writeln!(body, "Backup File:    {}", path);
        }
        if let Some(command_line) = &self.command_line {
            let _ = writeln!(body, "Backup Command: {}", command_line);
        }
        if let Some(exit_code) = self.exit_code {
            let _ = writeln!(body, "Return Value:   {}", exit_code);
        }

        if !self.scan_errors.is_empty() {
            body.push_str("\nFiles with unrecognized names:\n");
            for error in &self.scan_errors {
                let _ = writeln!(body, "    {}", error);
            }
        }

        if let Some(failure) = &self.failure {
            let _ = writeln!(body, "\nError:\n{}", failure);
        }

        if let Some(log_text) = &self.log_text {
            if !log_text.is_empty() {
                let _ = writeln!(body, "\nOutput of snapshot:\n{}", log_text);
            }
        }

        if self.delete_cutoff_all.is_some() || self.delete_cutoff_diff.is_some() {
            body.push_str("\nCLEANUP:\n");
            if let Some(cutoff) = self.delete_cutoff_all {
                let _ = writeln!(body, "Deleted all backups <= {}", cutoff);
            }
            if let Some(cutoff) = self.delete_cutoff_diff {
                let _ = writeln!(body, "Deleted differential backups <= {}", cutoff);
            }
            body.push_str("Deleted files:\n");
            for file in &self.deleted_files {
                let _ = writeln!(body, "    {}", file);
            }
        }

        body
    }
}
