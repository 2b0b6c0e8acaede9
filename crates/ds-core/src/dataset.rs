//! Dataset handle

use std::path::{Path, PathBuf};

use ds_annex::AnnexRepo;
use ds_fs::{DatasetPath, RepoPath};
use ds_git::{GitRepo, Repository};

use crate::config::DatasetConfig;
use crate::{Error, Result};

/// A dataset: the root of a repository hierarchy.
///
/// Keeps the path it was opened with, which may lead through a symlink.
/// Results are reported under that path; backend queries use the canonical
/// root.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: DatasetPath,
    root: DatasetPath,
    config: DatasetConfig,
}

impl Dataset {
    /// Open the dataset rooted exactly at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())?;
        let no_dataset = || Error::NoDataset { path: path.clone() };
        let root = DatasetPath::canonical(&path).map_err(|_| no_dataset())?;
        if !GitRepo::is_valid_repo(root.to_native()) {
            return Err(no_dataset());
        }
        let config = DatasetConfig::load(&root)?;
        tracing::debug!(path = %path.display(), root = %root, "Opened dataset");
        Ok(Self {
            path: DatasetPath::new(&path),
            root,
            config,
        })
    }

    /// Open the innermost dataset containing `start`.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        let no_dataset = || Error::NoDataset {
            path: start.to_path_buf(),
        };
        let repo = git2::Repository::discover(start).map_err(|_| no_dataset())?;
        let workdir: PathBuf = repo.workdir().ok_or_else(no_dataset)?.to_path_buf();
        Self::open(workdir)
    }

    /// Path the dataset was opened with.
    pub fn path(&self) -> &DatasetPath {
        &self.path
    }

    /// Canonical root of the dataset's repository.
    pub fn root(&self) -> &DatasetPath {
        &self.root
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Resolve user input, relative to the dataset path, into the canonical space.
    ///
    /// Input at or under the dataset path is rebased onto the root first, so a
    /// dataset opened through a symlink accepts `.` and paths through the link.
    /// The final component is never resolved.
    pub fn resolve(&self, input: impl AsRef<Path>) -> DatasetPath {
        let input = input.as_ref();
        let joined = if input.is_absolute() || input.to_string_lossy().starts_with('/') {
            DatasetPath::new(input)
        } else {
            self.path.join(&input.to_string_lossy())
        };
        let rebased = joined.rebase(&self.path, &self.root).unwrap_or(joined);
        DatasetPath::resolve(&self.root, rebased.as_str())
    }

    /// Map a canonical path into the path space the dataset was opened with.
    pub fn to_user(&self, path: &DatasetPath) -> DatasetPath {
        path.rebase(&self.root, &self.path)
            .unwrap_or_else(|| path.clone())
    }

    /// Repository handle for the dataset root.
    pub fn repo(&self) -> Result<DatasetRepo> {
        DatasetRepo::open(&self.root)
    }
}

/// True if `path` holds a repository marker.
pub(crate) fn is_repository_root(path: &DatasetPath) -> bool {
    path.join(RepoPath::GitDir.as_str()).exists_or_symlink()
}

/// A repository inside a dataset hierarchy, with or without a content store.
#[derive(Debug, Clone)]
pub enum DatasetRepo {
    Git(GitRepo),
    Annex(AnnexRepo),
}

impl DatasetRepo {
    /// Open the repository at `root`, picking up its content store if it has one.
    pub fn open(root: &DatasetPath) -> Result<Self> {
        let git = GitRepo::open(root.to_native())?;
        if AnnexRepo::has_store(&git)? {
            let annex = AnnexRepo::open(root.to_native())?;
            return Ok(Self::Annex(annex));
        }
        Ok(Self::Git(git))
    }

    pub fn repository(&self) -> &dyn Repository {
        match self {
            Self::Git(repo) => repo,
            Self::Annex(repo) => repo,
        }
    }

    pub fn annex(&self) -> Option<&AnnexRepo> {
        match self {
            Self::Git(_) => None,
            Self::Annex(repo) => Some(repo),
        }
    }
}
