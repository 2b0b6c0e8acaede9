//! Status command implementation

use std::path::PathBuf;

use ds_core::{AnnexReport, Dataset, ResultRecord, StatusOptions, status};

use super::{parse_modes, requested};
use crate::cli::InspectArgs;
use crate::error::{CliError, Result};

/// Run the status command
pub fn run_status(
    ds: &Dataset,
    paths: Vec<PathBuf>,
    inspect: &InspectArgs,
    recursive: bool,
    recursion_limit: Option<i32>,
    annex: Option<&str>,
) -> Result<Vec<ResultRecord>> {
    let (untracked, submodules) = parse_modes(inspect)?;
    let annex = match annex {
        None => AnnexReport::None,
        Some("basic") => AnnexReport::Basic,
        Some("availability") => AnnexReport::Availability,
        Some(other) => return Err(CliError::user(format!("Unknown annex report: {other}"))),
    };
    let options = StatusOptions {
        paths: requested(paths),
        untracked,
        submodules,
        recursive,
        recursion_limit,
        annex,
    };
    Ok(status(ds, &options)?)
}
