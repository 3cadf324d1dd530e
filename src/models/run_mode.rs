/// Defines whether a run touches the outside world or only reports what it
/// would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Normal operation - run the snapshot tool and delete aged backups
    Real,

    /// Plan and sweep are computed and reported, but the snapshot tool is
    /// not called and no file is deleted
    Simulate,
}

impl RunMode {
    pub fn is_simulate(&self) -> bool {
        matches!(self, RunMode::Simulate)
    }

    /// Returns true if the snapshot executable should actually be invoked
    pub fn should_run_snapshot(&self) -> bool {
        matches!(self, RunMode::Real)
    }

    /// Returns true if aged backup files should actually be removed
    pub fn should_delete_files(&self) -> bool {
        matches!(self, RunMode::Real)
    }

    /// Prefix for the run summary subject line
    pub fn subject_prefix(&self) -> &'static str {
        match self {
            RunMode::Real => "",
            RunMode::Simulate => "SIMULATED ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_run_snapshot() {
        assert!(RunMode::Real.should_run_snapshot());
        assert!(!RunMode::Simulate.should_run_snapshot());
    }

    #[test]
    fn test_should_delete_files() {
        assert!(RunMode::Real.should_delete_files());
        assert!(!RunMode::Simulate.should_delete_files());
    }

    #[test]
    fn test_subject_prefix() {
        assert_eq!(RunMode::Real.subject_prefix(), "");
        assert_eq!(RunMode::Simulate.subject_prefix(), "SIMULATED ");
    }
}
