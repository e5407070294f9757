//! Fetch-and-cache engine for the Quarry artifact cache.
//!
//! Mirrors a remote maven-layout artifact repository into a local
//! directory tree. Resolving a coordinate yields a [`Resource`] handle
//! that works the same whether the artifact is already cached, currently
//! being downloaded by another caller, or fetched afresh:
//!
//! - [`Resource::open`] streams the bytes, even while the download is
//!   still in flight
//! - [`Resource::wait`] awaits on-disk completion
//! - at most one transfer ever runs per destination path
//!
//! # Example
//!
//! ```no_run
//! use quarry_repository::{Repository, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::new("https://repo.example.com/releases", "/var/cache/quarry")?;
//! let repository = Repository::new(&settings)?;
//!
//! let resource = repository.resolve("org.example:tool:jar:1.2.3").await?;
//!
//! // Stream bytes while the download is still in flight.
//! let mut reader = resource.open()?;
//! let mut contents = Vec::new();
//! reader.read_to_end(&mut contents).await?;
//!
//! // Or wait for the file to be fully on disk.
//! let path = resource.wait().await?;
//! println!("cached at {}", path.display());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod error;
mod metadata;
mod repository;
mod resource;
mod transfer;

pub use client::{CONNECT_TIMEOUT, HttpClient, TRANSFER_TIMEOUT};
pub use error::{FetchError, Result};
pub use repository::{Repository, TRANSFER_SLOTS};
pub use resource::{Resource, ResourceReader};

// Re-export commonly used types
pub use quarry_config::{Credentials, Settings};
pub use quarry_core::{Coordinate, CoordinateError};
