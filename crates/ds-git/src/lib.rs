//! Git layer of the dataset status engine
//!
//! Lists repository content into [`Snapshot`]s, reconciles two snapshots into
//! a [`StatusMap`], recursing into nested repositories, and saves changes back.
//! All version-control access goes through the [`GitBackend`] trait.

pub mod backend;
pub mod cache;
pub mod cli;
pub mod error;
pub mod listing;
pub mod modes;
pub mod repo;
pub mod result;
pub mod save;
pub mod snapshot;
mod status;

pub use backend::{AddOptions, BackendOutcome, CommitOutcome, GitBackend};
pub use cache::{QueryKey, QueryLabel, StatusCache};
pub use cli::CliGit;
pub use error::{Error, Result};
pub use modes::{SubmoduleMode, UntrackedMode};
pub use repo::{DiffOptions, GitRepo, Repository};
pub use result::{Action, ResultRecord, ResultStatus};
pub use save::{ContentAdder, DEFAULT_MESSAGE, SaveRequest, SaveRun};
pub use snapshot::{AnnexProps, ContentRecord, EntryType, Snapshot, State, StatusMap, StatusRecord};
