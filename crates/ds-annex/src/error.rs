//! Error types for ds-annex

use std::path::PathBuf;

/// Result type for ds-annex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ds-annex operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Git(#[from] ds_git::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command `{command}` failed with exit code {code}: {stderr}")]
    AnnexQuery {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("No content store initialized in {path}")]
    NotAnAnnex { path: PathBuf },

    #[error("Malformed content store record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Content-store failures surface through the repository interface as
/// version-control backend failures.
impl From<Error> for ds_git::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Git(inner) => inner,
            Error::Io(inner) => ds_git::Error::Io(inner),
            Error::AnnexQuery {
                command,
                code,
                stderr,
            } => ds_git::Error::BackendQuery {
                command,
                code,
                stderr,
            },
            other => ds_git::Error::backend("git annex", -1, other.to_string()),
        }
    }
}
