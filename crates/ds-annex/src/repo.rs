//! Content-store-aware repository

use std::path::Path;
use std::rc::Rc;

use ds_fs::{DatasetPath, RepoPath};
use ds_git::{
    AddOptions, BackendOutcome, ContentAdder, ContentRecord, DiffOptions, EntryType, GitRepo,
    Repository, Snapshot, StatusCache, StatusMap, SubmoduleMode, UntrackedMode,
};

use crate::availability::{ObjectStore, mark_availability};
use crate::backend::{AnnexBackend, AnnexEntry, CliAnnex};
use crate::{Error, Result};

/// Starting point for [`AnnexRepo::content_annexinfo`].
///
/// Annexed files missing from the starting point are added as file records.
#[derive(Debug, Clone, Default)]
pub enum AnnexInit {
    /// Start from the git content listing.
    Git,
    /// Start from the given snapshot.
    Seed(Snapshot),
    /// Report annexed files only.
    #[default]
    Empty,
}

/// A repository with a content store.
#[derive(Clone)]
pub struct AnnexRepo {
    git: GitRepo,
    annex: Rc<dyn AnnexBackend>,
}

impl std::fmt::Debug for AnnexRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnexRepo").field("root", self.git.root()).finish()
    }
}

impl AnnexRepo {
    pub fn new(git: GitRepo, annex: Rc<dyn AnnexBackend>) -> Self {
        Self { git, annex }
    }

    /// Open the repository at `path` with the CLI backends.
    ///
    /// Fails with [`Error::NotAnAnnex`] when no content store is initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let git = GitRepo::open(path)?;
        if !Self::has_store(&git)? {
            return Err(Error::NotAnAnnex {
                path: git.root().to_native(),
            });
        }
        let annex = Rc::new(CliAnnex::new(git.root().clone()));
        Ok(Self::new(git, annex))
    }

    /// True if `git` has an initialized content store.
    pub fn has_store(git: &GitRepo) -> Result<bool> {
        let git_dir = git.backend().git_dir()?;
        Ok(git_dir.join(RepoPath::AnnexDir.as_str()).is_dir())
    }

    pub fn object_store(&self) -> Result<ObjectStore> {
        Ok(ObjectStore::new(&self.git.backend().git_dir()?))
    }

    fn rel_paths(&self, paths: Option<&[DatasetPath]>) -> Result<Option<Vec<String>>> {
        let rel = paths
            .map(|paths| paths.iter().map(|p| self.git.relative(p)).collect())
            .transpose()?;
        Ok(rel)
    }

    /// Annexed entries in the working tree, or at `reference`, under `paths`.
    fn annexed(&self, paths: Option<&[DatasetPath]>, reference: Option<&str>) -> Result<Vec<(DatasetPath, AnnexEntry)>> {
        let root = self.git.root();
        let entries = match reference {
            None => self.annex.find(self.rel_paths(paths)?.as_deref())?,
            Some(reference) => self.annex.findref(reference)?,
        };
        let entries = entries
            .into_iter()
            .map(|entry| (root.join(&entry.file), entry))
            .filter(|(path, _)| paths.is_none_or(|paths| paths.iter().any(|p| path.starts_with(p))))
            .collect();
        Ok(entries)
    }

    /// Content-store properties for content under `paths`.
    ///
    /// With `availability`, every annexed record is probed for a local payload.
    pub fn content_annexinfo(
        &self,
        paths: Option<&[DatasetPath]>,
        reference: Option<&str>,
        init: AnnexInit,
        availability: bool,
    ) -> Result<Snapshot> {
        let mut info = match init {
            AnnexInit::Git => self.git.content_info(paths, reference, UntrackedMode::All)?,
            AnnexInit::Seed(snapshot) => snapshot,
            AnnexInit::Empty => Snapshot::new(),
        };
        if paths.is_some_and(<[DatasetPath]>::is_empty) {
            return Ok(info);
        }
        for (path, entry) in self.annexed(paths, reference)? {
            info.entry(path)
                .or_insert_with(|| ContentRecord::new(EntryType::File, None))
                .annex = Some(entry.props());
        }
        if availability {
            self.mark_content_availability(&mut info)?;
        }
        Ok(info)
    }

    /// Probe local availability for every annexed record of `snapshot`.
    pub fn mark_content_availability(&self, snapshot: &mut Snapshot) -> Result<()> {
        let store = self.object_store()?;
        mark_availability(&store, snapshot.values_mut().filter_map(|r| r.annex.as_mut()));
        Ok(())
    }

    /// Attach content-store properties to a status map.
    ///
    /// Properties recorded at `HEAD` are applied first and overridden by the
    /// working tree, so deleted annexed files keep their recorded key.
    pub fn annotate(&self, status: &mut StatusMap, paths: Option<&[DatasetPath]>, availability: bool) -> Result<()> {
        if paths.is_some_and(<[DatasetPath]>::is_empty) {
            return Ok(());
        }
        let recorded = match self.git.head_revision()? {
            Some(_) => self.annexed(paths, Some("HEAD"))?,
            None => Vec::new(),
        };
        let mut annotated = 0;
        for (path, entry) in recorded.into_iter().chain(self.annexed(paths, None)?) {
            if let Some(record) = status.get_mut(&path) {
                record.annex = Some(entry.props());
                annotated += 1;
            }
        }
        tracing::debug!(repo = %self.git.root(), annotated, availability, "Annotated status with content-store properties");
        if availability {
            let store = self.object_store()?;
            mark_availability(&store, status.values_mut().filter_map(|r| r.annex.as_mut()));
        }
        Ok(())
    }

    /// Working-tree status with content-store properties and availability.
    pub fn annexstatus(&self, paths: Option<&[DatasetPath]>, untracked: UntrackedMode) -> Result<StatusMap> {
        let options = DiffOptions {
            paths,
            untracked,
            submodules: SubmoduleMode::Other,
        };
        let mut status = self.status(options, &mut StatusCache::new())?;
        self.annotate(&mut status, paths, true)?;
        Ok(status)
    }
}

impl ContentAdder for AnnexRepo {
    fn add_content(&self, paths: &[String], options: &AddOptions) -> ds_git::Result<Vec<BackendOutcome>> {
        Ok(self.annex.add(paths, options)?)
    }
}

impl Repository for AnnexRepo {
    fn git(&self) -> &GitRepo {
        &self.git
    }

    fn adder(&self) -> &dyn ContentAdder {
        self
    }
}
