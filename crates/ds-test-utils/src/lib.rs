//! Shared test utilities for the ds workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`] - git repository fixtures driven through the `git` CLI
//! - [`repo`] - [`TestDataset`](repo::TestDataset) builder for real datasets
//!   with nested repositories
//! - [`fake`] - in-memory backends that count the queries made against them

pub mod fake;
pub mod git;
pub mod repo;
