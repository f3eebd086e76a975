//! Connection settings for the walkthrough.
//!
//! Every setting is resolved in priority order:
//! 1. CLI flag (`--endpoint`, `--user`, ...)
//! 2. Environment variable (`ARANGO_ENDPOINT`, `ARANGO_USER`, `ARANGO_PASSWORD`)
//! 3. Config file (`--config PATH`, else `<config dir>/arango-walkthrough/config.json`)
//! 4. Built-in default (local server, `root` with an empty password)
use crate::driver::ClientOptions;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Current schema version for `config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8529";
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_ENDPOINT: &str = "ARANGO_ENDPOINT";
pub const ENV_USER: &str = "ARANGO_USER";
pub const ENV_PASSWORD: &str = "ARANGO_PASSWORD";

const CONFIG_DIR_NAME: &str = "arango-walkthrough";
const CONFIG_FILE_NAME: &str = "config.json";

/// On-disk config; absent fields fall through to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub batch_size: Option<u32>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub client: ClientOptions,
    pub batch_size: Option<u32>,
}

/// Default location of the config file, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the config file.
///
/// An explicit path must exist; the default path is optional.
pub fn load_config_file(explicit: Option<&Path>) -> Result<Option<ConfigFile>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(None),
        },
    };
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: ConfigFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config_file(&config)?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(Some(config))
}

pub fn validate_config_file(config: &ConfigFile) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    Ok(())
}

/// Merge all sources into final settings.
///
/// `env` looks up an environment variable by name; it is a parameter so the
/// merge can be exercised without touching the process environment.
pub fn resolve_settings(
    overrides: &Overrides,
    file: Option<&ConfigFile>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let endpoint = overrides
        .endpoint
        .clone()
        .or_else(|| env(ENV_ENDPOINT))
        .or_else(|| file.and_then(|file| file.endpoint.clone()))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let user = overrides
        .user
        .clone()
        .or_else(|| env(ENV_USER))
        .or_else(|| file.and_then(|file| file.user.clone()))
        .unwrap_or_else(|| DEFAULT_USER.to_string());
    let password = overrides
        .password
        .clone()
        .or_else(|| env(ENV_PASSWORD))
        .or_else(|| file.and_then(|file| file.password.clone()))
        .unwrap_or_default();
    let timeout_secs = overrides
        .timeout_secs
        .or_else(|| file.and_then(|file| file.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let batch_size = overrides
        .batch_size
        .or_else(|| file.and_then(|file| file.batch_size));

    validate_endpoint(&endpoint)?;
    if timeout_secs == 0 {
        return Err(anyhow!("timeout_secs must be greater than zero"));
    }
    if batch_size == Some(0) {
        return Err(anyhow!("batch_size must be greater than zero"));
    }

    Ok(Settings {
        client: ClientOptions {
            endpoint,
            user,
            password,
            timeout: Duration::from_secs(timeout_secs),
        },
        batch_size,
    })
}

/// Read a variable from the process environment, treating empty as unset.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn validate_endpoint(endpoint: &str) -> Result<()> {
    let rest = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .ok_or_else(|| anyhow!("endpoint must start with http:// or https:// (got {endpoint:?})"))?;
    if rest.trim_end_matches('/').is_empty() {
        return Err(anyhow!("endpoint has no host (got {endpoint:?})"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
