//! Well-known locations inside a dataset and its git directory.

use std::path::Path;

/// Standard repository filesystem markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoPath {
    /// The `.git` entry marking a repository root (directory or gitfile)
    GitDir,
    /// The `.gitmodules` registry of nested repositories
    GitModules,
    /// The content store inside a git directory
    AnnexDir,
    /// The object store inside a git directory
    AnnexObjects,
    /// The dataset configuration file, relative to the dataset root
    DatasetConfigFile,
}

impl RepoPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitDir => ".git",
            Self::GitModules => ".gitmodules",
            Self::AnnexDir => "annex",
            Self::AnnexObjects => "annex/objects",
            Self::DatasetConfigFile => ".dataset/config.toml",
        }
    }
}

impl AsRef<Path> for RepoPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
