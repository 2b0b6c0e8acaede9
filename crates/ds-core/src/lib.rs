//! Dataset commands
//!
//! A dataset is a repository together with the repositories nested in it.
//! [`status`], [`diff`] and [`save`] route requested paths to the repository
//! that owns them and report one [`ResultRecord`] per path, in the path space
//! the dataset was opened with.

pub mod config;
pub mod dataset;
pub mod error;
pub mod routing;
pub mod save;
pub mod status;

pub use config::{DatasetConfig, SaveConfig, StatusConfig};
pub use dataset::{Dataset, DatasetRepo};
pub use ds_git::{Action, EntryType, ResultRecord, ResultStatus, State, SubmoduleMode, UntrackedMode};
pub use error::{Error, Result};
pub use routing::{NOT_UNDERNEATH, Routing, Target, owning_repository, route};
pub use save::{SaveOptions, save};
pub use status::{AnnexReport, DiffRequest, StatusOptions, diff, status};
