//! Settings loading for the Quarry artifact cache.
//!
//! Quarry reads its process configuration once at startup from
//! `~/.quarry/config.json`: the remote repository base URI, the local
//! repository root, and optional fixed credentials. Missing or
//! contradictory values fail fast at load time.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod settings;

pub use error::{ConfigError, Result};
pub use settings::{Credentials, Settings};
