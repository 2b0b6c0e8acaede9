//! Version-control backend interface
//!
//! The status engine never implements version control itself. It asks a
//! [`GitBackend`] for raw listings and mutations and interprets the answers.
//! [`CliGit`](crate::cli::CliGit) is the production implementation; tests
//! substitute in-memory doubles.

use std::rc::Rc;

use ds_fs::DatasetPath;

use crate::Result;
use crate::modes::UntrackedMode;

/// Options for adding content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Force content into git (`Some(true)`) or into the content store
    /// (`Some(false)`); `None` leaves the decision to the backend.
    pub to_git: Option<bool>,
    /// Only stage changes to already tracked content.
    pub update: bool,
}

/// Outcome of a mutation for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOutcome {
    /// Backend command that produced the outcome (`add`, `rm`, ...).
    pub command: String,
    /// Path relative to the repository root, in git's POSIX notation.
    pub file: Option<String>,
    pub success: bool,
    /// Content key assigned by a content store, if any.
    pub key: Option<String>,
    pub message: Option<String>,
}

impl BackendOutcome {
    pub fn ok(command: &str, file: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            file: Some(file.into()),
            success: true,
            key: None,
            message: None,
        }
    }

    pub fn failed(command: &str, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            file: Some(file.into()),
            success: false,
            key: None,
            message: Some(message.into()),
        }
    }
}

/// Outcome of a commit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was recorded.
    Committed { revision: String },
    /// Nothing net changed for the given paths; no commit was made.
    NothingToCommit,
}

/// Raw access to one version-control repository.
///
/// Path arguments are relative to [`root`](GitBackend::root) in POSIX notation.
/// `None` means "all content"; callers never pass an empty slice.
pub trait GitBackend {
    /// Canonical root of the working tree.
    fn root(&self) -> &DatasetPath;

    /// Location of the repository's git directory.
    fn git_dir(&self) -> Result<DatasetPath>;

    /// Working-tree listing.
    ///
    /// Tracked entries come as `<mode> <sha> <stage>\t<path>`, untracked
    /// entries as bare paths, all NUL-terminated.
    fn ls_files(&self, paths: Option<&[String]>, untracked: UntrackedMode) -> Result<String>;

    /// Listing of the recorded tree at `reference`.
    ///
    /// Entries come as `<mode> <type> <sha>\t<path>`, NUL-terminated.
    fn ls_tree(&self, paths: Option<&[String]>, reference: &str) -> Result<String>;

    /// NUL-terminated paths whose on-disk content differs from the index.
    fn ls_modified(&self, paths: Option<&[String]>) -> Result<String>;

    /// Revision `HEAD` points to, or `None` on an unborn branch.
    fn head_revision(&self) -> Result<Option<String>>;

    /// Stage content, reporting one outcome per path.
    fn add(&self, paths: &[String], options: &AddOptions) -> Result<Vec<BackendOutcome>>;

    /// Stage removal of content, reporting one outcome per path.
    fn remove(&self, paths: &[String]) -> Result<Vec<BackendOutcome>>;

    /// Commit the given paths. Committing nothing is not an error.
    fn commit(&self, paths: &[String], message: &str) -> Result<CommitOutcome>;

    /// Register the repository at `path` as a nested repository.
    fn add_submodule(&self, path: &str) -> Result<()>;

    /// Attach a lightweight tag to `HEAD`.
    fn tag(&self, name: &str) -> Result<()>;

    /// Open the repository rooted exactly at `path`.
    ///
    /// Fails with [`Error::InvalidNestedRepository`](crate::Error::InvalidNestedRepository)
    /// when there is no valid repository root there.
    fn open_nested(&self, path: &DatasetPath) -> Result<Rc<dyn GitBackend>>;
}
