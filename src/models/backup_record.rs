use crate::models::error::{Result, RotateError};
use chrono::NaiveDateTime;
use std::fmt;

/// Date format used in backup file names. Should not be changed.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const TIMESTAMP_LEN: usize = 15;

/// Primary artifact extension written by the snapshot tool.
pub const SNAPSHOT_EXT: &str = "sna";
/// Index file written next to every full backup; differentials are computed
/// against it.
pub const INDEX_EXT: &str = "hsh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupKind {
    Full,
    Diff,
}

impl BackupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::Full => "full",
            BackupKind::Diff => "diff",
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One existing backup artifact, reconstructed from its file name on every
/// run. The file name is the durable record; nothing else is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackupRecord {
    pub file_name: String,
    pub machine: String,
    pub drive: String,
    pub chain_id: u32,
    pub timestamp: NaiveDateTime,
    pub kind: BackupKind,
}

impl BackupRecord {
    /// Parse a canonical backup file name of the form
    /// `machine_drive_b<chain>_<YYYYMMDD-HHMMSS>_<full|diff>.<ext>`.
    ///
    /// A name that does not fully validate is rejected wholesale; no partial
    /// record is ever produced.
    pub fn parse(file_name: &str) -> Result<BackupRecord> {
        let (stem, _) = split_base_ext(file_name);
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() != 5 {
            return Err(RotateError::MalformedName {
                file: file_name.to_string(),
            });
        }

        let nr = parts[2];
        let digits = nr.strip_prefix('b').unwrap_or("");
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RotateError::InvalidChainId {
                file: file_name.to_string(),
                part: nr.to_string(),
            });
        }
        let chain_id: u32 = digits.parse().map_err(|_| RotateError::InvalidChainId {
            file: file_name.to_string(),
            part: nr.to_string(),
        })?;

        let kind = match parts[4] {
            "full" => BackupKind::Full,
            "diff" => BackupKind::Diff,
            other => {
                return Err(RotateError::InvalidKind {
                    file: file_name.to_string(),
                    kind: other.to_string(),
                })
            }
        };

        let ds = parts[3];
        if ds.len() != TIMESTAMP_LEN {
            return Err(RotateError::InvalidTimestamp {
                file: file_name.to_string(),
                part: ds.to_string(),
            });
        }
        let timestamp = NaiveDateTime::parse_from_str(ds, TIMESTAMP_FORMAT).map_err(|_| {
            RotateError::InvalidTimestamp {
                file: file_name.to_string(),
                part: ds.to_string(),
            }
        })?;

        Ok(BackupRecord {
            file_name: file_name.to_string(),
            machine: parts[0].to_string(),
            drive: parts[1].to_string(),
            chain_id,
            timestamp,
            kind,
        })
    }

    /// File name without its extension, shared by all sibling artifacts.
    pub fn base_name(&self) -> &str {
        split_base_ext(&self.file_name).0
    }

    /// Name of the index file belonging to this record.
    pub fn index_file_name(&self) -> String {
        format!("{}.{}", self.base_name(), INDEX_EXT)
    }
}

/// Canonical backup file name for the given fields.
pub fn format_file_name(
    machine: &str,
    drive: &str,
    chain_id: u32,
    timestamp: NaiveDateTime,
    kind: BackupKind,
) -> String {
    format!(
        "{}_{}_b{}_{}_{}.{}",
        machine,
        drive,
        chain_id,
        timestamp.format(TIMESTAMP_FORMAT),
        kind.as_str(),
        SNAPSHOT_EXT
    )
}

/// True for files that carry the primary artifact extension and belong to
/// the given machine/drive pair. Everything else is skipped by the scan
/// without being reported.
pub fn is_candidate(file_name: &str, machine: &str, drive: &str) -> bool {
    file_name.ends_with(&format!(".{}", SNAPSHOT_EXT))
        && file_name.starts_with(&format!("{}_{}_", machine, drive))
}

/// Extensions that are deleted together with a backup: the snapshot data
/// files (`.sn*`, which covers split archives) and the index file.
pub fn is_sibling_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    ext.starts_with("sn") || ext == INDEX_EXT
}

/// Split a file name into the part before its last `.` and the extension.
/// A name without a `.` has an empty extension.
pub fn split_base_ext(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) => (&file_name[..idx], &file_name[idx + 1..]),
        None => (file_name, ""),
    }
}
