use crate::models::backup_record::{format_file_name, BackupKind, BackupRecord};
use crate::models::error::{Result, RotateError};
use crate::models::plan::BackupPlan;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::path::PathBuf;

/// Decide the next backup for the given record set.
///
/// With no full backup on record the chain bootstraps at `b1` with a full
/// backup. Otherwise the last full backup's chain keeps receiving
/// differentials until `diff_count_limit` of them exist, at which point the
/// chain rolls over to a new full backup. `diff_count_limit` of 0 means every
/// backup after the first is full.
///
/// `index_exists` answers whether an index file with the given name is
/// present in the backup directory. A differential can only be planned while
/// its anchoring full backup's index file exists; its absence aborts
/// planning with `MissingIndexArtifact`.
pub fn plan_next<F>(
    records: &[BackupRecord],
    diff_count_limit: u32,
    machine: &str,
    drive: &str,
    now: NaiveDateTime,
    index_exists: F,
) -> Result<BackupPlan>
where
    F: Fn(&str) -> bool,
{
    // Sort by chain number and date. The last full backup in this order is
    // the most recent one.
    let mut sorted: Vec<&BackupRecord> = records.iter().collect();
    sorted.sort_by_key(|r| (r.chain_id, r.timestamp));

    let last_full = sorted.iter().rev().find(|r| r.kind == BackupKind::Full);

    let (chain_id, kind, reference_index) = match last_full {
        None => (1, BackupKind::Full, None),
        Some(full) => {
            let diff_count = sorted
                .iter()
                .filter(|r| r.chain_id == full.chain_id && r.kind == BackupKind::Diff)
                .count() as u32;
            debug!(
                "Last full backup is b{} with {} differential(s), limit {}",
                full.chain_id, diff_count, diff_count_limit
            );

            if diff_count < diff_count_limit {
                let index = full.index_file_name();
                if !index_exists(&index) {
                    return Err(RotateError::MissingIndexArtifact {
                        path: PathBuf::from(index),
                    });
                }
                (full.chain_id, BackupKind::Diff, Some(index))
            } else {
                (full.chain_id + 1, BackupKind::Full, None)
            }
        }
    };

    let file_name = format_file_name(machine, drive, chain_id, now, kind);
    info!("Planned {} backup b{}: {}", kind, chain_id, file_name);

    Ok(BackupPlan {
        chain_id,
        kind,
        file_name,
        reference_index,
    })
}
