//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ds - Inspect and record the state of datasets
#[derive(Parser, Debug)]
#[command(name = "ds")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Dataset to operate on (default: the dataset containing the current directory)
    #[arg(short, long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Output one JSON object per result
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Options selecting how untracked content and nested datasets are inspected
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectArgs {
    /// How to report untracked content
    #[arg(short, long, value_parser = ["no", "normal", "all"])]
    pub untracked: Option<String>,

    /// How to evaluate the state of nested datasets
    #[arg(long, value_parser = ["no", "other", "all"])]
    pub submodules: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Report the state of dataset content
    ///
    /// Examples:
    ///   ds status                  # Whole dataset
    ///   ds status data/ -r         # A directory, including nested datasets
    ///   ds status --annex basic    # With content-store keys and sizes
    Status {
        /// Paths to report on
        paths: Vec<PathBuf>,

        #[command(flatten)]
        inspect: InspectArgs,

        /// Descend into nested datasets
        #[arg(short, long)]
        recursive: bool,

        /// Deepest nesting level to descend to (negative: unlimited)
        #[arg(short = 'R', long, allow_negative_numbers = true)]
        recursion_limit: Option<i32>,

        /// Report content-store properties
        #[arg(long, value_parser = ["basic", "availability"])]
        annex: Option<String>,
    },

    /// Report what differs between two states of a dataset
    Diff {
        /// Paths to compare
        paths: Vec<PathBuf>,

        /// Original state
        #[arg(long, default_value = "HEAD")]
        from: String,

        /// Changed state (default: the working tree)
        #[arg(long)]
        to: Option<String>,

        #[command(flatten)]
        inspect: InspectArgs,
    },

    /// Record the current state of a dataset
    ///
    /// Examples:
    ///   ds save -m "Add raw data"      # Everything
    ///   ds save -r                     # Nested datasets first
    ///   ds save code/ --to-git         # Store content in git directly
    Save {
        /// Paths to save
        paths: Vec<PathBuf>,

        /// Commit message
        #[arg(short, long, conflicts_with = "message_file")]
        message: Option<String>,

        /// Read the commit message from a file
        #[arg(short = 'F', long)]
        message_file: Option<PathBuf>,

        /// Descend into nested datasets
        #[arg(short, long)]
        recursive: bool,

        /// Deepest nesting level to descend to (negative: unlimited)
        #[arg(short = 'R', long, allow_negative_numbers = true)]
        recursion_limit: Option<i32>,

        /// Only save changes to content that is already tracked
        #[arg(short, long)]
        updated: bool,

        /// Store content in git instead of the content store
        #[arg(long, conflicts_with = "to_annex")]
        to_git: bool,

        /// Store content in the content store
        #[arg(long)]
        to_annex: bool,

        /// Tag the new revision
        #[arg(long)]
        version_tag: Option<String>,
    },
}
