//! Configuration for Moss.
//!
//! Read from `~/.moss/config.toml`:
//!
//! ```toml
//! [remote]
//! base_url = "https://db.example.com/api/v1/"
//! public_key = "${MOSS_PUBLIC_KEY}"
//! private_key = "${MOSS_PRIVATE_KEY}"
//! label = "moss-todo"
//! request_timeout_secs = 30
//!
//! [retry]
//! max_retries = 2
//! initial_delay_ms = 500
//! max_delay_ms = 8000
//! ```
//!
//! String values may reference environment variables as `${VAR}`. The
//! `MOSS_BASE_URL`, `MOSS_PUBLIC_KEY` and `MOSS_PRIVATE_KEY` variables fill in
//! whatever the file leaves out.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use moss_types::{AccessKey, KeyPair};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_BASE_URL: &str = "MOSS_BASE_URL";
pub const ENV_PUBLIC_KEY: &str = "MOSS_PUBLIC_KEY";
pub const ENV_PRIVATE_KEY: &str = "MOSS_PRIVATE_KEY";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct MossConfig {
    pub remote: Option<RemoteSection>,
    pub retry: Option<RetrySection>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    /// The config file involved, for the variants that read one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Missing(_) | ConfigError::Invalid { .. } => None,
        }
    }
}

#[derive(Default, Deserialize)]
pub struct RemoteSection {
    pub base_url: Option<String>,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    /// Label stored with both keys when a database is created.
    pub label: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

// Manual Debug impl to prevent leaking access keys in logs.
impl std::fmt::Debug for RemoteSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mask(opt: Option<&String>) -> &'static str {
            if opt.is_some() { "[REDACTED]" } else { "None" }
        }

        f.debug_struct("RemoteSection")
            .field("base_url", &self.base_url)
            .field("public_key", &mask(self.public_key.as_ref()))
            .field("private_key", &mask(self.private_key.as_ref()))
            .field("label", &self.label)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl RemoteSection {
    pub fn base_url(&self) -> Result<String, ConfigError> {
        self.base_url
            .as_deref()
            .map(expand_env_vars)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("remote.base_url"))
    }

    pub fn key_pair(&self) -> Result<KeyPair, ConfigError> {
        let public = access_key(self.public_key.as_deref(), "remote.public_key")?;
        let private = access_key(self.private_key.as_deref(), "remote.private_key")?;
        Ok(KeyPair::new(public, private))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

fn access_key(raw: Option<&str>, field: &'static str) -> Result<AccessKey, ConfigError> {
    let raw = raw.ok_or(ConfigError::Missing(field))?;
    AccessKey::new(expand_env_vars(raw)).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })
}

/// Backoff tuning. Unset fields keep the client defaults.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct RetrySection {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

impl RetrySection {
    #[must_use]
    pub fn initial_delay(&self) -> Option<Duration> {
        self.initial_delay_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay_ms.map(Duration::from_millis)
    }
}

/// Expand `${VAR}` references from the environment.
///
/// Unset variables expand to the empty string. An unclosed `${` is kept as is.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

impl MossConfig {
    /// Load `~/.moss/config.toml`. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Fill settings the file leaves out from the `MOSS_*` environment variables.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| env::var(name).ok())
    }

    /// Fill missing remote settings from `lookup`, keyed by variable name.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let remote = self.remote.get_or_insert_with(RemoteSection::default);
        for (slot, name) in [
            (&mut remote.base_url, ENV_BASE_URL),
            (&mut remote.public_key, ENV_PUBLIC_KEY),
            (&mut remote.private_key, ENV_PRIVATE_KEY),
        ] {
            if slot.is_none()
                && let Some(value) = lookup(name).filter(|v| !v.trim().is_empty())
            {
                *slot = Some(value);
            }
        }
        self
    }

    pub fn remote(&self) -> Result<&RemoteSection, ConfigError> {
        self.remote.as_ref().ok_or(ConfigError::Missing("remote"))
    }

    #[must_use]
    pub fn retry(&self) -> RetrySection {
        self.retry.unwrap_or_default()
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".moss").join("config.toml"))
}
