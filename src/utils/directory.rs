use crate::models::backup_record::{is_candidate, is_sibling_extension, split_base_ext, BackupRecord};
use crate::models::error::{Result, RotateError};
use crate::models::run_mode::RunMode;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List the artifact file names in the backup directory that belong to the
/// given machine/drive pair. Only the top level of the directory is scanned;
/// files that do not match the pair or the artifact extension are skipped.
pub fn list_candidate_files(dir: &Path, machine: &str, drive: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|cause| RotateError::DirectoryRead {
            path: dir.to_path_buf(),
            cause: cause.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_candidate(&name, machine, drive) {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse every candidate file in the backup directory into a record. Parse
/// failures are collected and returned alongside the good records so one bad
/// file name does not abort the scan.
pub fn scan_records(
    dir: &Path,
    machine: &str,
    drive: &str,
) -> Result<(Vec<BackupRecord>, Vec<RotateError>)> {
    let names = list_candidate_files(dir, machine, drive)?;

    let mut records = Vec::new();
    let mut failures = Vec::new();
    for name in names {
        match BackupRecord::parse(&name) {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!("{}", error);
                failures.push(error);
            }
        }
    }
    Ok((records, failures))
}

/// Delete the artifacts behind the given records: for each record, every
/// file in the backup directory sharing its base name with a `.sn*` or
/// `.hsh` extension. Base names are compared case-insensitively. Returns the
/// paths that were (or in simulate mode, would have been) deleted.
pub fn delete_backup_files(
    dir: &Path,
    records: &[BackupRecord],
    mode: RunMode,
) -> Result<Vec<PathBuf>> {
    let mut deleted = Vec::new();

    for record in records {
        let base = record.base_name().to_lowercase();
        for entry in WalkDir::new(dir).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|cause| RotateError::DirectoryRead {
                path: dir.to_path_buf(),
                cause: cause.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            let (entry_base, entry_ext) = split_base_ext(&name);
            if entry_base == base && is_sibling_extension(entry_ext) {
                info!("Deleting {}", entry.path().display());
                if mode.should_delete_files() {
                    fs::remove_file(entry.path())?;
                }
                deleted.push(entry.path().to_path_buf());
            }
        }
    }

    deleted.sort();
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::backup_record::{BackupKind, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_list_candidate_files_filters_pair_and_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host_c_b1_20240101-120000_full.sna");
        touch(dir.path(), "host_c_b1_20240101-120000_full.hsh");
        touch(dir.path(), "host_c_b1_20240102-120000_diff.sna");
        touch(dir.path(), "host_d_b1_20240101-120000_full.sna");
        touch(dir.path(), "other_c_b1_20240101-120000_full.sna");
        touch(dir.path(), "notes.txt");

        let files = list_candidate_files(dir.path(), "host", "c").unwrap();
        assert_eq!(
            files,
            vec![
                "host_c_b1_20240101-120000_full.sna",
                "host_c_b1_20240102-120000_diff.sna",
            ]
        );
    }

    #[test]
    fn test_list_candidate_files_missing_directory() {
        let result = list_candidate_files(Path::new("/no/such/backupdir"), "host", "c");
        assert!(matches!(result, Err(RotateError::DirectoryRead { .. })));
    }

    #[test]
    fn test_scan_records_collects_parse_failures() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host_c_b1_20240101-120000_full.sna");
        touch(dir.path(), "host_c_b2_20240102-120000_incr.sna");
        touch(dir.path(), "host_c_bx_20240103-120000_full.sna");

        let (records, failures) = scan_records(dir.path(), "host", "c").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chain_id, 1);
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|e| e.is_parse_failure()));
    }

    #[test]
    fn test_delete_backup_files_fans_out_to_siblings() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host_c_b1_20240101-120000_full.sna");
        touch(dir.path(), "host_c_b1_20240101-120000_full.sn1");
        touch(dir.path(), "host_c_b1_20240101-120000_full.hsh");
        touch(dir.path(), "host_c_b1_20240101-120000_full.txt");
        touch(dir.path(), "host_c_b2_20240201-120000_full.sna");

        let record =
            BackupRecord::parse("host_c_b1_20240101-120000_full.sna").unwrap();
        let deleted = delete_backup_files(dir.path(), &[record], RunMode::Real).unwrap();

        assert_eq!(deleted.len(), 3);
        assert!(!dir.path().join("host_c_b1_20240101-120000_full.sna").exists());
        assert!(!dir.path().join("host_c_b1_20240101-120000_full.sn1").exists());
        assert!(!dir.path().join("host_c_b1_20240101-120000_full.hsh").exists());
        // Unrelated extension and the other chain stay.
        assert!(dir.path().join("host_c_b1_20240101-120000_full.txt").exists());
        assert!(dir.path().join("host_c_b2_20240201-120000_full.sna").exists());
    }

    #[test]
    fn test_delete_backup_files_simulate_keeps_everything() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "host_c_b1_20240101-120000_full.sna");
        touch(dir.path(), "host_c_b1_20240101-120000_full.hsh");

        let record =
            BackupRecord::parse("host_c_b1_20240101-120000_full.sna").unwrap();
        let deleted = delete_backup_files(dir.path(), &[record], RunMode::Simulate).unwrap();

        assert_eq!(deleted.len(), 2);
        assert!(dir.path().join("host_c_b1_20240101-120000_full.sna").exists());
        assert!(dir.path().join("host_c_b1_20240101-120000_full.hsh").exists());
    }

    #[test]
    fn test_scan_then_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let timestamp =
            NaiveDateTime::parse_from_str("20240101-120000", TIMESTAMP_FORMAT).unwrap();
        let name = crate::models::backup_record::format_file_name(
            "host",
            "c",
            1,
            timestamp,
            BackupKind::Full,
        );
        touch(dir.path(), &name);

        let (records, failures) = scan_records(dir.path(), "host", "c").unwrap();
        assert!(failures.is_empty());
        assert_eq!(records.len(), 1);

        let deleted = delete_backup_files(dir.path(), &records, RunMode::Real).unwrap();
        assert_eq!(deleted, vec![dir.path().join(&name)]);

        let (records, _) = scan_records(dir.path(), "host", "c").unwrap();
        assert!(records.is_empty());
    }
}
