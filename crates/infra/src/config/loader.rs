//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If no credential is set there, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PAGERLINE_API_TOKEN`: static API key (takes precedence over OAuth)
//! - `PAGERLINE_API_ENDPOINT`: base REST endpoint
//! - `PAGERLINE_TIMEOUT_SECS`: per-request timeout in seconds
//! - `PAGERLINE_USER_AGENT_SUFFIX`: appended to the User-Agent
//! - `PAGERLINE_OAUTH_CLIENT_ID`: OAuth client ID
//! - `PAGERLINE_OAUTH_CLIENT_SECRET`: OAuth client secret
//! - `PAGERLINE_OAUTH_SCOPES`: space or comma separated scopes
//! - `PAGERLINE_OAUTH_SCOPE_STYLE`: `classic` or `scoped` (default)
//! - `PAGERLINE_OAUTH_TOKEN_ENDPOINT`: token endpoint URL
//! - `PAGERLINE_OAUTH_TOKEN_FILE`: token cache file
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./pagerline.json` or `./pagerline.toml` (current working directory)
//! 2. `../pagerline.{json,toml}` and `../../pagerline.{json,toml}`
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};

use pagerline_domain::constants::{DEFAULT_API_ENDPOINT, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_ENDPOINT};
use pagerline_domain::{AuthConfig, ClientConfig, PagerlineError, Result, ScopeStyle};

const CONFIG_FILE_STEM: &str = "pagerline";

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `PagerlineError::Config` if configuration cannot be loaded from
/// either source or is invalid.
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Requires either `PAGERLINE_API_TOKEN` or the OAuth client variables.
///
/// # Errors
/// Returns `PagerlineError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<ClientConfig> {
    let api_endpoint =
        env_opt("PAGERLINE_API_ENDPOINT").unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
    let timeout_secs = match env_opt("PAGERLINE_TIMEOUT_SECS") {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| PagerlineError::Config(format!("Invalid timeout: {e}")))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    let user_agent_suffix = env_opt("PAGERLINE_USER_AGENT_SUFFIX");

    let auth = if let Some(token) = env_opt("PAGERLINE_API_TOKEN") {
        AuthConfig::Token { token }
    } else if let Some(client_id) = env_opt("PAGERLINE_OAUTH_CLIENT_ID") {
        let client_secret = env_var("PAGERLINE_OAUTH_CLIENT_SECRET")?;
        let scopes = split_scopes(&env_var("PAGERLINE_OAUTH_SCOPES")?);
        let scope_style = match env_opt("PAGERLINE_OAUTH_SCOPE_STYLE") {
            Some(raw) => parse_scope_style(&raw)?,
            None => ScopeStyle::default(),
        };
        AuthConfig::OAuth {
            client_id,
            client_secret,
            scopes,
            scope_style,
            token_endpoint: env_opt("PAGERLINE_OAUTH_TOKEN_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string()),
            token_file: env_opt("PAGERLINE_OAUTH_TOKEN_FILE").map(PathBuf::from),
        }
    } else {
        return Err(PagerlineError::Config(
            "Missing required environment variable: PAGERLINE_API_TOKEN or PAGERLINE_OAUTH_CLIENT_ID"
                .to_string(),
        ));
    };

    Ok(ClientConfig { api_endpoint, timeout_secs, user_agent_suffix, auth })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PagerlineError::Config` if the file is missing, unreadable or
/// invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PagerlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PagerlineError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PagerlineError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PagerlineError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PagerlineError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PagerlineError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .into_iter()
        .flat_map(|root| {
            ["json", "toml"].map(|extension| root.join(format!("{CONFIG_FILE_STEM}.{extension}")))
        })
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `PagerlineError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        PagerlineError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty environment variable, if set.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_scope_style(raw: &str) -> Result<ScopeStyle> {
    match raw.to_ascii_lowercase().as_str() {
        "classic" => Ok(ScopeStyle::Classic),
        "scoped" => Ok(ScopeStyle::Scoped),
        other => Err(PagerlineError::Config(format!("Invalid OAuth scope style: {other}"))),
    }
}
