//! Command implementations for ds-cli

pub mod diff;
pub mod save;
pub mod status;

use std::path::Path;

use ds_core::{Dataset, SubmoduleMode, UntrackedMode};

use crate::cli::InspectArgs;
use crate::error::Result;

pub use diff::run_diff;
pub use save::{SaveArgs, run_save};
pub use status::run_status;

/// Open the dataset named with `--dataset`, or the one containing `cwd`.
pub fn open_dataset(cwd: &Path, dataset: Option<&Path>) -> Result<Dataset> {
    let ds = match dataset {
        Some(path) => Dataset::open(cwd.join(path))?,
        None => Dataset::discover(cwd)?,
    };
    Ok(ds)
}

/// Parse the inspection modes given on the command line.
pub(crate) fn parse_modes(
    inspect: &InspectArgs,
) -> Result<(Option<UntrackedMode>, Option<SubmoduleMode>)> {
    let untracked = inspect
        .untracked
        .as_deref()
        .map(str::parse::<UntrackedMode>)
        .transpose()?;
    let submodules = inspect
        .submodules
        .as_deref()
        .map(str::parse::<SubmoduleMode>)
        .transpose()?;
    Ok((untracked, submodules))
}

/// `None` when no paths were given.
pub(crate) fn requested(paths: Vec<std::path::PathBuf>) -> Option<Vec<std::path::PathBuf>> {
    (!paths.is_empty()).then_some(paths)
}
