//! Shared test utilities for Quarry.
//!
//! Provides a wiremock-backed mock remote repository speaking the
//! maven-layout GET protocol, plus fixture builders for
//! `maven-metadata.xml` documents.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod fixtures;
mod mock_server;

pub use fixtures::{SnapshotEntry, snapshot_metadata};
pub use mock_server::MockRepo;
