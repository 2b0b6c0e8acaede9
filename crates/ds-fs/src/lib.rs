//! Filesystem layer for the dataset status engine
//!
//! Provides the normalized path type every snapshot is keyed by, the
//! well-known repository locations, and configuration loading.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::RepoPath;
pub use error::{Error, Result};
pub use path::DatasetPath;
