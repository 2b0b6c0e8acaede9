//! Content-store (git-annex) layer of the dataset status engine
//!
//! Files whose payload lives in the content store are tracked by git as
//! symlinks into the object store. This crate attaches content-store
//! properties (key, size, local availability) to snapshots and status maps,
//! and routes content to git or the store when saving.

pub mod availability;
pub mod backend;
pub mod error;
pub mod repo;

pub use availability::{HashLayout, ObjectStore, mark_availability};
pub use backend::{AnnexBackend, AnnexEntry, CliAnnex};
pub use error::{Error, Result};
pub use repo::{AnnexInit, AnnexRepo};
