use crate::models::backup_record::BackupKind;

/// Outcome of chain planning: which backup comes next and what its artifact
/// will be called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    pub chain_id: u32,
    pub kind: BackupKind,
    /// Canonical artifact file name, timestamped at planning time.
    pub file_name: String,
    /// Index file of the anchoring full backup. Present exactly when the
    /// plan is differential.
    pub reference_index: Option<String>,
}
