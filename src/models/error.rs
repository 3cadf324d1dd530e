use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RotateError {
    #[error("{file}: invalid backup file name. It must be composed of five parts separated by '_'")]
    MalformedName { file: String },

    #[error("{file}: invalid chain number '{part}'. It must be 'b' followed by a number")]
    InvalidChainId { file: String, part: String },

    #[error("{file}: invalid backup kind '{kind}'. Expected 'full' or 'diff'")]
    InvalidKind { file: String, kind: String },

    #[error("{file}: invalid timestamp '{part}'. Expected YYYYMMDD-HHMMSS")]
    InvalidTimestamp { file: String, part: String },

    #[error("Index file of the last full backup '{path}' does not exist")]
    MissingIndexArtifact { path: PathBuf },

    #[error("The snapshot executable '{path}' was not found")]
    ExecutableNotFound { path: PathBuf },

    #[error("The backup directory '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("The snapshot arguments file '{path}' was not found")]
    ArgsFileNotFound { path: PathBuf },

    #[error("Argument '{arg}' can not be used in the snapshot arguments file '{path}' because it is set by snaprotate itself")]
    ReservedArgument { arg: String, path: PathBuf },

    #[error("Snapshot returned with error code {code}")]
    SnapshotFailed { code: i32 },

    #[error("Failed to read backup directory '{path}': {cause}")]
    DirectoryRead { path: PathBuf, cause: io::Error },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RotateError {
    /// Per-file parse failures are collected during a scan and reported at
    /// the end of the run; every other variant aborts the current step.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            RotateError::MalformedName { .. }
                | RotateError::InvalidChainId { .. }
                | RotateError::InvalidKind { .. }
                | RotateError::InvalidTimestamp { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RotateError>;
