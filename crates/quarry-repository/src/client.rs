//! HTTP transport for artifact transfers.
//!
//! A thin wrapper over `reqwest` with the timeout profile artifacts need:
//! a short connect timeout and an hours-scale total timeout, since
//! artifacts may be large and networks slow.

use crate::error::{FetchError, Result};
use quarry_config::Credentials;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Connect timeout for every request.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout; transfers are allowed to run for hours.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(5 * 60 * 60);

const USER_AGENT: &str = concat!("quarry/", env!("CARGO_PKG_VERSION"));

/// HTTP client applying optional fixed credentials to every request.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("client", &"reqwest::Client")
            .field("credentials", &self.credentials.is_some())
            .finish()
    }
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// # Errors
    /// Returns [`FetchError::Config`] if the client cannot be built.
    pub fn new(credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TRANSFER_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .use_rustls_tls()
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Send a GET request, accepting only 200 OK.
    ///
    /// # Errors
    /// Returns [`FetchError::HttpStatus`] for any other status and
    /// [`FetchError::Network`] for transport failures.
    pub async fn get(&self, url: &Url) -> Result<Response> {
        debug!(url = %url, "GET request");

        let mut request = self.client.get(url.as_str());
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(url, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        assert!(HttpClient::new(None).is_ok());
    }

    #[test]
    fn client_debug_hides_credentials() {
        let client = HttpClient::new(Some(Credentials {
            username: "u".into(),
            password: "secret".into(),
        }))
        .unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
    }
}
