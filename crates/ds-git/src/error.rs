//! Error types for ds-git

use std::path::PathBuf;

/// Result type for ds-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ds-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] ds_fs::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command `{command}` failed with exit code {code}: {stderr}")]
    BackendQuery {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Unknown value for untracked mode: '{value}' (expected no, normal or all)")]
    AmbiguousUntrackedMode { value: String },

    #[error("Unknown value for submodule mode: '{value}' (expected no, other or all)")]
    AmbiguousSubmoduleMode { value: String },

    #[error("Not a valid repository at {path}: {reason}")]
    InvalidNestedRepository { path: PathBuf, reason: String },

    #[error("Path {path} is not underneath the dataset at {root}")]
    PathOutsideDataset { path: PathBuf, root: PathBuf },

    #[error("Could not register {path} as a nested repository: {message}")]
    RegistrationFailure { path: PathBuf, message: String },
}

impl Error {
    /// Build a [`Error::BackendQuery`] from the pieces of a failed command.
    pub fn backend(command: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::BackendQuery {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }
}
