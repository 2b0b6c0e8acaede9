//! Repository handle and the capability interface shared by all repository kinds

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use ds_fs::DatasetPath;

use crate::backend::{AddOptions, BackendOutcome, GitBackend};
use crate::cache::StatusCache;
use crate::cli::CliGit;
use crate::listing::{ListingKind, parse_listing, parse_paths};
use crate::modes::{SubmoduleMode, UntrackedMode};
use crate::save::{ContentAdder, SaveRequest, SaveRun};
use crate::snapshot::{EntryType, Snapshot, StatusMap};
use crate::{Error, Result};

/// Scope of a status or diff query.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOptions<'a> {
    /// Limit the query to these paths. `None` queries everything; an empty
    /// slice queries nothing.
    pub paths: Option<&'a [DatasetPath]>,
    pub untracked: UntrackedMode,
    pub submodules: SubmoduleMode,
}

impl<'a> DiffOptions<'a> {
    pub fn new(untracked: UntrackedMode, submodules: SubmoduleMode) -> Self {
        Self {
            paths: None,
            untracked,
            submodules,
        }
    }

    pub fn with_paths(mut self, paths: Option<&'a [DatasetPath]>) -> Self {
        self.paths = paths;
        self
    }
}

/// A plain version-control repository.
///
/// Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct GitRepo {
    backend: Rc<dyn GitBackend>,
}

impl fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepo").field("root", self.root()).finish()
    }
}

impl GitRepo {
    pub fn new(backend: Rc<dyn GitBackend>) -> Self {
        Self { backend }
    }

    /// Open the repository rooted at `path` with the `git` CLI backend.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Rc::new(CliGit::open(path)?)))
    }

    /// True if `path` is the root of a valid repository.
    pub fn is_valid_repo(path: impl AsRef<Path>) -> bool {
        CliGit::open(path).is_ok()
    }

    pub fn root(&self) -> &DatasetPath {
        self.backend.root()
    }

    pub fn backend(&self) -> &dyn GitBackend {
        self.backend.as_ref()
    }

    pub fn head_revision(&self) -> Result<Option<String>> {
        self.backend.head_revision()
    }

    /// Path of `path` relative to the repository root, as git expects it.
    pub fn relative(&self, path: &DatasetPath) -> Result<String> {
        path.relative_to(self.root())
            .ok_or_else(|| Error::PathOutsideDataset {
                path: path.to_native(),
                root: self.root().to_native(),
            })
    }

    fn relative_all(&self, paths: Option<&[DatasetPath]>) -> Result<Option<Vec<String>>> {
        paths
            .map(|paths| paths.iter().map(|p| self.relative(p)).collect())
            .transpose()
    }

    /// Identifier and type information for repository content.
    ///
    /// With `reference = None` the working tree is listed and `untracked`
    /// decides how untracked content is reported; otherwise the recorded tree
    /// at `reference` is listed. When explicit paths are combined with a
    /// reference, nested-repository entries that were not themselves requested
    /// are dropped.
    pub fn content_info(
        &self,
        paths: Option<&[DatasetPath]>,
        reference: Option<&str>,
        untracked: UntrackedMode,
    ) -> Result<Snapshot> {
        if paths.is_some_and(<[DatasetPath]>::is_empty) {
            return Ok(Snapshot::new());
        }
        let rel = self.relative_all(paths)?;
        let mut snapshot = match reference {
            None => {
                let raw = self.backend.ls_files(rel.as_deref(), untracked)?;
                parse_listing(self.root(), &raw, ListingKind::Worktree)
            }
            Some(reference) => {
                let raw = self.backend.ls_tree(rel.as_deref(), reference)?;
                parse_listing(self.root(), &raw, ListingKind::Tree)
            }
        };
        if let (Some(paths), Some(_)) = (paths, reference) {
            let requested: HashSet<&DatasetPath> = paths.iter().collect();
            snapshot.retain(|path, record| {
                requested.contains(path) || record.entry_type != EntryType::Dataset
            });
        }
        tracing::debug!(
            repo = %self.root(),
            reference = reference.unwrap_or("<worktree>"),
            entries = snapshot.len(),
            "Listed content"
        );
        Ok(snapshot)
    }

    /// Paths whose on-disk content differs from what git has recorded.
    pub(crate) fn modified_paths(&self, paths: Option<&[DatasetPath]>) -> Result<HashSet<DatasetPath>> {
        if paths.is_some_and(<[DatasetPath]>::is_empty) {
            return Ok(HashSet::new());
        }
        let rel = self.relative_all(paths)?;
        let raw = self.backend.ls_modified(rel.as_deref())?;
        Ok(parse_paths(self.root(), &raw))
    }
}

impl ContentAdder for GitRepo {
    fn add_content(&self, paths: &[String], options: &AddOptions) -> Result<Vec<BackendOutcome>> {
        self.backend.add(paths, options)
    }
}

/// Operations every repository kind offers.
///
/// Content-store-aware repositories wrap a [`GitRepo`] and override only what
/// they change.
pub trait Repository {
    /// The version-control layer underneath.
    fn git(&self) -> &GitRepo;

    /// The component that stages content during [`save`](Repository::save).
    fn adder(&self) -> &dyn ContentAdder;

    fn root(&self) -> &DatasetPath {
        self.git().root()
    }

    fn content_info(
        &self,
        paths: Option<&[DatasetPath]>,
        reference: Option<&str>,
        untracked: UntrackedMode,
    ) -> Result<Snapshot> {
        self.git().content_info(paths, reference, untracked)
    }

    /// Like [`diff`](Repository::diff), but clean content is reported too.
    fn diffstatus(
        &self,
        from: &str,
        to: Option<&str>,
        options: DiffOptions<'_>,
        cache: &mut StatusCache,
    ) -> Result<StatusMap> {
        self.git().diffstatus(from, to, options, cache)
    }

    /// State of the working tree relative to `HEAD`.
    fn status(&self, options: DiffOptions<'_>, cache: &mut StatusCache) -> Result<StatusMap> {
        tracing::debug!(
            repo = %self.root(),
            paths = options.paths.map_or_else(|| "all".to_string(), |p| p.len().to_string()),
            "Query status"
        );
        self.diffstatus("HEAD", None, options, cache)
    }

    /// Changes between `from` and `to` (the working tree when `None`).
    fn diff(
        &self,
        from: &str,
        to: Option<&str>,
        options: DiffOptions<'_>,
        cache: &mut StatusCache,
    ) -> Result<StatusMap> {
        let mut status = self.diffstatus(from, to, options, cache)?;
        status.retain(|_, record| !record.is_clean());
        Ok(status)
    }

    /// True if anything, including nested repositories, is not clean.
    fn dirty(&self) -> Result<bool> {
        let options = DiffOptions::new(UntrackedMode::Normal, SubmoduleMode::Other);
        let status = self.status(options, &mut StatusCache::new())?;
        Ok(status.values().any(|record| !record.is_clean()))
    }

    /// Save the changes described by `request`, one result at a time.
    fn save(&self, request: SaveRequest) -> SaveRun<'_> {
        SaveRun::new(self.git(), self.adder(), request)
    }
}

impl Repository for GitRepo {
    fn git(&self) -> &GitRepo {
        self
    }

    fn adder(&self) -> &dyn ContentAdder {
        self
    }
}
