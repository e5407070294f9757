//! Mock remote artifact repository for integration tests.

use quarry_core::Coordinate;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock maven-layout repository over HTTP.
#[derive(Debug)]
pub struct MockRepo {
    server: MockServer,
}

impl MockRepo {
    /// Start a new mock repository server.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URI of the mock repository.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// The underlying wiremock server, for custom mocks and verification.
    #[must_use]
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    /// Remote path of an artifact, with leading slash.
    #[must_use]
    pub fn artifact_path(coordinate: &Coordinate) -> String {
        Self::layout_path(coordinate, &coordinate.file_name())
    }

    /// Remote path of the metadata document next to an artifact.
    #[must_use]
    pub fn metadata_path(coordinate: &Coordinate) -> String {
        Self::layout_path(coordinate, "maven-metadata.xml")
    }

    fn layout_path(coordinate: &Coordinate, file_name: &str) -> String {
        let mut result = String::new();
        for segment in coordinate.group_segments() {
            result.push('/');
            result.push_str(segment);
        }
        result.push('/');
        result.push_str(coordinate.name());
        result.push('/');
        result.push_str(&coordinate.base_version());
        result.push('/');
        result.push_str(file_name);
        result
    }

    /// Serve an artifact's bytes at its layout path.
    pub async fn register_artifact(&self, coordinate: &Coordinate, bytes: &[u8]) {
        self.register_artifact_with_delay(coordinate, bytes, Duration::ZERO)
            .await;
    }

    /// Serve an artifact's bytes with a response delay, and require the
    /// path to be requested exactly `expected` times.
    pub async fn register_artifact_expect(
        &self,
        coordinate: &Coordinate,
        bytes: &[u8],
        delay: Duration,
        expected: u64,
    ) {
        Mock::given(method("GET"))
            .and(path(Self::artifact_path(coordinate)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(bytes.to_vec())
                    .set_delay(delay),
            )
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Serve an artifact's bytes with a response delay.
    pub async fn register_artifact_with_delay(
        &self,
        coordinate: &Coordinate,
        bytes: &[u8],
        delay: Duration,
    ) {
        Mock::given(method("GET"))
            .and(path(Self::artifact_path(coordinate)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(bytes.to_vec())
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve a metadata document at the coordinate's metadata path.
    pub async fn register_metadata(&self, coordinate: &Coordinate, document: &str) {
        Mock::given(method("GET"))
            .and(path(Self::metadata_path(coordinate)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(document.to_string(), "application/xml"),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer an artifact path with a bare status code.
    pub async fn register_status(&self, coordinate: &Coordinate, status: u16) {
        self.register_status_with_delay(coordinate, status, Duration::ZERO)
            .await;
    }

    /// Answer an artifact path with a status code after a delay.
    pub async fn register_status_with_delay(
        &self,
        coordinate: &Coordinate,
        status: u16,
        delay: Duration,
    ) {
        Mock::given(method("GET"))
            .and(path(Self::artifact_path(coordinate)))
            .respond_with(ResponseTemplate::new(status).set_delay(delay))
            .mount(&self.server)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let coordinate = Coordinate::parse("org.example:tool:jar:1.0").unwrap();
        assert_eq!(
            MockRepo::artifact_path(&coordinate),
            "/org/example/tool/1.0/tool-1.0.jar"
        );
        assert_eq!(
            MockRepo::metadata_path(&coordinate),
            "/org/example/tool/1.0/maven-metadata.xml"
        );
    }

    #[test]
    fn snapshot_paths_bucket_under_base_version() {
        let coordinate =
            Coordinate::parse("org.example:tool:jar:1.0-20240101.120000-3").unwrap();
        assert_eq!(
            MockRepo::artifact_path(&coordinate),
            "/org/example/tool/1.0-SNAPSHOT/tool-1.0-20240101.120000-3.jar"
        );
    }
}
