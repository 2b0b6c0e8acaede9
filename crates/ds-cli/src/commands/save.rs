//! Save command implementation

use std::path::PathBuf;

use ds_core::{Dataset, ResultRecord, SaveOptions, save};

use super::requested;
use crate::error::Result;

/// Arguments of the save command
#[derive(Debug, Clone, Default)]
pub struct SaveArgs {
    pub paths: Vec<PathBuf>,
    pub message: Option<String>,
    pub message_file: Option<PathBuf>,
    pub recursive: bool,
    pub recursion_limit: Option<i32>,
    pub updated: bool,
    pub to_git: bool,
    pub to_annex: bool,
    pub version_tag: Option<String>,
}

/// Run the save command
pub fn run_save(ds: &Dataset, args: SaveArgs) -> Result<Vec<ResultRecord>> {
    let to_git = match (args.to_git, args.to_annex) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    let options = SaveOptions {
        message: args.message,
        message_file: args.message_file,
        paths: requested(args.paths),
        version_tag: args.version_tag,
        recursive: args.recursive,
        recursion_limit: args.recursion_limit,
        updated: args.updated,
        to_git,
    };
    Ok(save(ds, &options)?)
}
