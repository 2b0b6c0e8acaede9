//! Diff command implementation

use std::path::PathBuf;

use ds_core::{Dataset, DiffRequest, ResultRecord, diff};

use super::{parse_modes, requested};
use crate::cli::InspectArgs;
use crate::error::Result;

/// Run the diff command
pub fn run_diff(
    ds: &Dataset,
    paths: Vec<PathBuf>,
    from: String,
    to: Option<String>,
    inspect: &InspectArgs,
) -> Result<Vec<ResultRecord>> {
    let (untracked, submodules) = parse_modes(inspect)?;
    let request = DiffRequest {
        from,
        to,
        paths: requested(paths),
        untracked,
        submodules,
    };
    Ok(diff(ds, &request)?)
}
