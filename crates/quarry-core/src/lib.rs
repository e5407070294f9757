//! Core types for the Quarry artifact cache.
//!
//! This crate provides the foundational artifact identity used throughout
//! Quarry:
//! - [`Coordinate`]: a validated `(group, name, type, classifier, version)`
//!   tuple
//! - Snapshot detection and base-version normalization
//! - Remote/local path segment derivation

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod coordinate;

pub use coordinate::{Coordinate, CoordinateError};

/// Result type for coordinate operations.
pub type Result<T> = std::result::Result<T, CoordinateError>;
