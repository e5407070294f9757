//! The repository cache: coordinate resolution and single-flight fetching.

use crate::client::HttpClient;
use crate::error::Result;
use crate::metadata::{self, METADATA_FILE};
use crate::resource::Resource;
use crate::transfer::TransferCell;
use parking_lot::Mutex;
use quarry_config::Settings;
use quarry_core::Coordinate;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;

/// Number of transfers allowed to run concurrently.
pub const TRANSFER_SLOTS: usize = 4;

/// Local mirror of a remote artifact repository.
///
/// Resolving a coordinate returns a [`Resource`] immediately; any
/// required download runs in the background on one of [`TRANSFER_SLOTS`]
/// slots. For a given destination path at most one transfer is ever in
/// flight: concurrent resolves share the entry inserted under the cache
/// lock. Entries are never evicted; a failed entry stays failed for the
/// lifetime of the `Repository`, and retrying means constructing a fresh
/// one.
#[derive(Debug)]
pub struct Repository {
    base_uri: String,
    root: PathBuf,
    client: HttpClient,
    permits: Arc<Semaphore>,
    entries: Mutex<HashMap<PathBuf, Resource>>,
}

impl Repository {
    /// Create a repository over the configured remote and local root.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = HttpClient::new(settings.credentials.clone())?;
        Ok(Self {
            base_uri: settings.base_uri.trim_end_matches('/').to_string(),
            root: settings.root.clone(),
            client,
            permits: Arc::new(Semaphore::new(TRANSFER_SLOTS)),
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// The local repository root.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Resolve a colon-delimited coordinate string.
    ///
    /// # Errors
    /// Fails on malformed or invalid coordinates, or on snapshot metadata
    /// resolution.
    pub async fn resolve(&self, input: &str) -> Result<Resource> {
        self.resolve_coordinate(&Coordinate::parse(input)?).await
    }

    /// Resolve a coordinate to a resource handle.
    ///
    /// A snapshot version is first resolved to its current concrete build
    /// via remote metadata; this is the only case where resolution itself
    /// awaits network I/O. The returned handle's own transfer, if any,
    /// always runs in the background.
    ///
    /// # Errors
    /// Fails on snapshot metadata resolution; transfer failures surface
    /// through the returned [`Resource`].
    pub async fn resolve_coordinate(&self, coordinate: &Coordinate) -> Result<Resource> {
        let concrete = if coordinate.is_snapshot() {
            self.find_snapshot_version(coordinate).await?
        } else {
            coordinate.clone()
        };
        let url = self.remote_url(&concrete, &concrete.file_name())?;
        Ok(self.fetch(url, self.local_path(&concrete, &concrete.file_name()), false))
    }

    /// Resolve the concrete build a snapshot coordinate currently points at.
    ///
    /// Metadata is always re-fetched (`force_refresh`), never trusted from
    /// a previously mirrored file; it may have changed on the remote.
    async fn find_snapshot_version(&self, coordinate: &Coordinate) -> Result<Coordinate> {
        debug!(coordinate = %coordinate, "resolving snapshot version");
        let url = self.remote_url(coordinate, METADATA_FILE)?;
        let resource = self.fetch(url, self.local_path(coordinate, METADATA_FILE), true);

        let mut reader = resource.open()?;
        let mut document = Vec::new();
        reader.read_to_end(&mut document).await?;

        metadata::resolve_snapshot(&document, coordinate)
    }

    /// Look up or create the resource for a destination path.
    ///
    /// The insert happens under the cache lock, before the transfer task
    /// is activated: a racing caller for the same path observes the same
    /// in-progress resource rather than starting a second transfer.
    fn fetch(&self, url: Url, path: PathBuf, force_refresh: bool) -> Resource {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(&path) {
            debug!(path = %path.display(), "cache hit");
            return existing.clone();
        }

        if !force_refresh && path.is_file() {
            debug!(path = %path.display(), "destination already on disk");
            let resource = Resource::complete(path.clone());
            entries.insert(path, resource.clone());
            return resource;
        }

        let (cell, job) = TransferCell::prepare(
            self.client.clone(),
            url,
            path.clone(),
            Arc::clone(&self.permits),
        );
        let resource = Resource::incomplete(cell);
        entries.insert(path, resource.clone());
        drop(entries);

        // Activate only after the handle is published.
        if let Some(job) = job {
            tokio::spawn(job.run());
        }
        resource
    }

    fn remote_url(&self, coordinate: &Coordinate, file_name: &str) -> Result<Url> {
        let mut url = String::with_capacity(self.base_uri.len() + 64);
        url.push_str(&self.base_uri);
        for segment in coordinate.group_segments() {
            url.push('/');
            url.push_str(segment);
        }
        url.push('/');
        url.push_str(coordinate.name());
        url.push('/');
        url.push_str(&coordinate.base_version());
        url.push('/');
        url.push_str(file_name);
        Ok(Url::parse(&url)?)
    }

    fn local_path(&self, coordinate: &Coordinate, file_name: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in coordinate.group_segments() {
            path.push(segment);
        }
        path.push(coordinate.name());
        path.push(coordinate.base_version());
        path.push(file_name);
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repository(base_uri: &str) -> (Repository, TempDir) {
        let temp = TempDir::new().unwrap();
        let settings = Settings::new(base_uri, temp.path().join("repository")).unwrap();
        (Repository::new(&settings).unwrap(), temp)
    }

    #[test]
    fn remote_url_layout() {
        let (repository, _temp) = repository("https://repo.example.com/releases");
        let coordinate = Coordinate::parse("org.example.tools:tool:jar:1.0").unwrap();
        let url = repository
            .remote_url(&coordinate, &coordinate.file_name())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://repo.example.com/releases/org/example/tools/tool/1.0/tool-1.0.jar"
        );
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let (repository, _temp) = repository("https://repo.example.com/releases///");
        let coordinate = Coordinate::parse("g:a:jar:1.0").unwrap();
        let url = repository
            .remote_url(&coordinate, &coordinate.file_name())
            .unwrap();
        assert_eq!(url.as_str(), "https://repo.example.com/releases/g/a/1.0/a-1.0.jar");
    }

    #[test]
    fn timestamped_build_buckets_under_snapshot_directory() {
        let (repository, _temp) = repository("https://repo.example.com");
        let coordinate = Coordinate::parse("g:a:jar:1.0-20240101.120000-3").unwrap();
        let url = repository
            .remote_url(&coordinate, &coordinate.file_name())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://repo.example.com/g/a/1.0-SNAPSHOT/a-1.0-20240101.120000-3.jar"
        );

        let path = repository.local_path(&coordinate, &coordinate.file_name());
        assert_eq!(
            path,
            repository
                .root()
                .join("g/a/1.0-SNAPSHOT/a-1.0-20240101.120000-3.jar")
        );
    }

    #[test]
    fn local_path_mirrors_remote_layout() {
        let (repository, _temp) = repository("https://repo.example.com");
        let coordinate =
            Coordinate::parse("org.example:tool:jar:sources:2.1").unwrap();
        let path = repository.local_path(&coordinate, &coordinate.file_name());
        assert_eq!(
            path,
            repository
                .root()
                .join("org/example/tool/2.1/tool-2.1-sources.jar")
        );
    }
}
