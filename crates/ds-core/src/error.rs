//! Error types for ds-core

use std::path::PathBuf;

/// Result type for ds-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ds-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No dataset at or above the given location
    #[error("No dataset found at {path}")]
    NoDataset { path: PathBuf },

    /// Both an inline message and a message file were given
    #[error("Both a message and a message file were given; use one of them")]
    ConflictingMessage,

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from ds-fs
    #[error(transparent)]
    Fs(#[from] ds_fs::Error),

    /// Version-control error from ds-git
    #[error(transparent)]
    Git(#[from] ds_git::Error),

    /// Content-store error from ds-annex
    #[error(transparent)]
    Annex(#[from] ds_annex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
