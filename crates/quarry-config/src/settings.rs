//! Process settings loaded once at startup.

use crate::error::{ConfigError, Result};
use directories::UserDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the user home holding Quarry state.
const QUARRY_DIR: &str = ".quarry";

/// Settings file name inside the Quarry directory.
const CONFIG_FILE: &str = "config.json";

/// Default repository root inside the Quarry directory.
const REPOSITORY_DIR: &str = "repository";

/// Fixed credentials applied to every outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username for HTTP Basic auth.
    pub username: String,
    /// Password for HTTP Basic auth.
    pub password: String,
}

/// Raw on-disk shape of `config.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    base_uri: Option<String>,
    root: Option<PathBuf>,
    username: Option<String>,
    password: Option<String>,
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Remote repository base URI.
    pub base_uri: String,
    /// Local repository root directory; created on load.
    pub root: PathBuf,
    /// Optional fixed credentials.
    pub credentials: Option<Credentials>,
}

impl Settings {
    /// Create settings with explicit values, creating the root directory.
    ///
    /// # Errors
    /// Returns an error if the root directory cannot be created.
    pub fn new(base_uri: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| ConfigError::io(&root, &e))?;
        Ok(Self {
            base_uri: base_uri.into(),
            root,
            credentials: None,
        })
    }

    /// Attach fixed credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Load settings from `~/.quarry/config.json`.
    ///
    /// # Errors
    /// Fails fast on a missing home directory, missing or unreadable
    /// configuration file, invalid JSON, a missing `base_uri`, or a
    /// username configured without a password (or vice versa).
    pub fn load() -> Result<Self> {
        let dirs = UserDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
        Self::load_from(&dirs.home_dir().join(QUARRY_DIR))
    }

    /// Load settings from `config.json` inside the given Quarry directory.
    ///
    /// # Errors
    /// Same failure modes as [`Settings::load`].
    pub fn load_from(quarry_dir: &Path) -> Result<Self> {
        let config_path = quarry_dir.join(CONFIG_FILE);
        debug!(path = %config_path.display(), "loading settings");

        if !config_path.is_file() {
            return Err(ConfigError::NotFound { path: config_path });
        }

        let raw = fs::read_to_string(&config_path).map_err(|e| ConfigError::io(&config_path, &e))?;
        let file: SettingsFile =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: config_path,
                message: e.to_string(),
            })?;

        let base_uri = file
            .base_uri
            .ok_or(ConfigError::MissingValue { key: "base_uri" })?;

        let credentials = match (file.username, file.password) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialCredentials),
        };

        let root = file
            .root
            .unwrap_or_else(|| quarry_dir.join(REPOSITORY_DIR));
        fs::create_dir_all(&root).map_err(|e| ConfigError::io(&root, &e))?;

        Ok(Self {
            base_uri,
            root,
            credentials,
        })
    }
}
