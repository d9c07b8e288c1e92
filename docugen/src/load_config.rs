/// `load_config` module: reads the static YAML config and injects secrets from
/// the environment into a resolved [`CliConfig`].
///
/// # Accepted YAML
/// ```yaml
/// backend:
///   base_url: http://localhost:8087
/// auth:
///   username: someone@example.com
/// output:
///   dir: ./docs
/// ```
/// Every section is optional. Secrets never live in the file:
/// - `DOCUGEN_PASSWORD`: password for `auth.username`
/// - `GEMINI_API_KEY`: model API key, sent with processing requests
/// - `DOCUGEN_API_BASE`: overrides `backend.base_url`
///
/// # Errors
/// Read and parse failures are reported as `anyhow::Error` with the path.
use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::client::DEFAULT_BASE_URL;

pub const DEFAULT_OUTPUT_DIR: &str = "./docs";

/// Fully resolved settings for one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub output_dir: PathBuf,
}

impl CliConfig {
    /// Username and password, when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct StaticConfig {
    #[serde(default)]
    backend: BackendSection,
    #[serde(default)]
    auth: AuthSection,
    #[serde(default)]
    output: OutputSection,
}

#[derive(Debug, Default, Deserialize)]
struct BackendSection {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthSection {
    username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputSection {
    dir: Option<PathBuf>,
}

/// Load `path` when given, otherwise start from defaults, then apply the
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let static_conf = match path {
        Some(path) => read_static(path)?,
        None => {
            info!("No config file given, using defaults");
            StaticConfig::default()
        }
    };

    let base_url = match non_empty_env("DOCUGEN_API_BASE") {
        Some(url) => {
            info!(base_url = %url, "Backend base URL overridden from env");
            url
        }
        None => static_conf
            .backend
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    };

    let password = non_empty_env("DOCUGEN_PASSWORD");
    let api_key = non_empty_env("GEMINI_API_KEY");
    info!(
        password_set = password.is_some(),
        api_key_set = api_key.is_some(),
        "Secrets read from environment"
    );

    Ok(CliConfig {
        base_url,
        username: static_conf.auth.username,
        password,
        api_key,
        output_dir: static_conf
            .output
            .dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
    })
}

fn read_static(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    // An empty file is a valid, all-defaults config.
    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
