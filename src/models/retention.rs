/// Age limits for the retention sweep, in days. Either limit may be absent;
/// with both set, a record is deleted if either one applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionThresholds {
    /// Restricts differential backups only.
    pub diff_max_age_days: Option<i64>,
    /// Restricts every backup regardless of kind.
    pub all_max_age_days: Option<i64>,
}

impl RetentionThresholds {
    pub fn is_unset(&self) -> bool {
        self.diff_max_age_days.is_none() && self.all_max_age_days.is_none()
    }
}
