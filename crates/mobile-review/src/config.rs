use std::collections::HashMap;
use std::env::VarError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

pub const APP_NAME_KEY: &str = "app_name";
pub const ARTIFACT_URL_KEY: &str = "artifact_url";
pub const BRANCH_KEY: &str = "branch";
pub const COMMIT_HASH_KEY: &str = "commit_hash";
pub const AUTH_TOKEN_KEY: &str = "SERVICE_AUTH_TOKEN";

/// Overrides the endpoint URL from any config file.
pub const ENDPOINT_OVERRIDE_KEY: &str = "MOBILE_REVIEW_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "https://fake.globo.com/apps/mobile/";
pub const DEFAULT_EXPECTED_STATUS: u16 = 201;

const DEFAULT_CONFIG_NAME: &str = "mobile-review.toml";

/// A variable is set, but its value cannot be read as text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Input variable {key} is not valid UTF-8, please fulfill {key}'s input variable.")]
pub struct InputError {
    pub key: String,
}

/// Where the raw build inputs come from.
pub trait InputSource {
    /// `Ok(None)` when the key is unset.
    fn get(&self, key: &str) -> Result<Option<String>, InputError>;
}

/// Reads inputs from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl InputSource for EnvSource {
    fn get(&self, key: &str) -> Result<Option<String>, InputError> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(InputError {
                key: key.to_string(),
            }),
        }
    }
}

impl InputSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Result<Option<String>, InputError> {
        Ok(HashMap::get(self, key).cloned())
    }
}

/// The five raw input variables, unvalidated. Absent keys read as "".
#[derive(Clone, PartialEq, Eq)]
pub struct Inputs {
    pub app_name: String,
    pub artifact_url: String,
    pub branch: String,
    pub commit_hash: String,
    pub auth_token: String,
}

impl Inputs {
    pub fn load(source: &impl InputSource) -> Result<Self, InputError> {
        let read = |key: &str| source.get(key).map(Option::unwrap_or_default);
        Ok(Self {
            app_name: read(APP_NAME_KEY)?,
            artifact_url: read(ARTIFACT_URL_KEY)?,
            branch: read(BRANCH_KEY)?,
            commit_hash: read(COMMIT_HASH_KEY)?,
            auth_token: read(AUTH_TOKEN_KEY)?,
        })
    }
}

impl std::fmt::Debug for Inputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inputs")
            .field("app_name", &self.app_name)
            .field("artifact_url", &self.artifact_url)
            .field("branch", &self.branch)
            .field("commit_hash", &self.commit_hash)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    endpoint: EndpointConfig,
}

/// Where and how the review is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    /// The only status treated as success.
    pub expected_status: u16,
    /// Unset means wait for the service indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            expected_status: DEFAULT_EXPECTED_STATUS,
            timeout_secs: None,
        }
    }
}

impl EndpointConfig {
    /// Load endpoint settings from an explicit path, or search upward from the
    /// current dir, then the user config dir. Falls back to built-in defaults.
    /// `MOBILE_REVIEW_ENDPOINT` from `source` replaces the URL.
    pub fn load(path_override: Option<PathBuf>, source: &impl InputSource) -> Result<Self> {
        let path = match path_override {
            Some(p) => Some(p),
            None => find_upwards(DEFAULT_CONFIG_NAME).or_else(user_config_file),
        };

        let mut cfg = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("no endpoint config file found, using defaults");
                Self::default()
            }
        };

        if let Some(url) = source.get(ENDPOINT_OVERRIDE_KEY)?.filter(|u| !u.is_empty()) {
            tracing::debug!(%url, "endpoint overridden from {}", ENDPOINT_OVERRIDE_KEY);
            cfg.url = url;
        }

        anyhow::ensure!(
            (100..=999).contains(&cfg.expected_status),
            "expected_status {} is not a valid HTTP status code",
            cfg.expected_status
        );
        anyhow::ensure!(
            cfg.timeout_secs != Some(0),
            "timeout_secs must be at least 1; leave it unset to wait indefinitely"
        );
        Ok(cfg)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("Parsing TOML config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded endpoint config");
        Ok(file.endpoint)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn find_upwards(file_name: &str) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

fn user_config_file() -> Option<PathBuf> {
    let candidate = dirs::config_dir()?.join("mobile-review").join("config.toml");
    candidate.exists().then_some(candidate)
}
