use crate::models::backup_record::{BackupKind, BackupRecord};
use crate::models::retention::RetentionThresholds;
use chrono::{Duration, NaiveDateTime};
use log::info;
use std::collections::HashSet;

/// Compute the set of records eligible for deletion under the given age
/// thresholds.
///
/// A record qualifies when its timestamp is at or before `now` minus the
/// threshold. The differential threshold looks at differentials only, the
/// all-backups threshold at every record; the two compose with OR. A full
/// backup is never deleted while any record of its chain survives the sweep,
/// since the survivors would lose their restore anchor.
///
/// The result is a set; it is returned ordered by chain and timestamp so
/// reports and tests are stable.
pub fn compute_deletions(
    records: &[BackupRecord],
    now: NaiveDateTime,
    thresholds: &RetentionThresholds,
) -> Vec<BackupRecord> {
    let mut doomed: HashSet<&BackupRecord> = HashSet::new();

    if let Some(days) = thresholds.diff_max_age_days {
        let cutoff = now - Duration::days(days);
        info!("Deleting differential backups <= {}", cutoff);
        doomed.extend(
            records
                .iter()
                .filter(|r| r.kind == BackupKind::Diff && r.timestamp <= cutoff),
        );
    }

    if let Some(days) = thresholds.all_max_age_days {
        let cutoff = now - Duration::days(days);
        info!("Deleting all backups <= {}", cutoff);
        doomed.extend(records.iter().filter(|r| r.timestamp <= cutoff));
    }

    // Do not delete full backups whose chain still has surviving members.
    let kept_chains: HashSet<u32> = records
        .iter()
        .filter(|r| !doomed.contains(r))
        .map(|r| r.chain_id)
        .collect();
    doomed.retain(|r| !(r.kind == BackupKind::Full && kept_chains.contains(&r.chain_id)));

    let mut result: Vec<BackupRecord> = doomed.into_iter().cloned().collect();
    result.sort_by(|a, b| {
        (a.chain_id, a.timestamp, &a.file_name).cmp(&(b.chain_id, b.timestamp, &b.file_name))
    });
    result
}
