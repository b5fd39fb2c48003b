//! Configuration loader implementations.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::schema::BridgeConfig;

/// Bind host override.
pub const ENV_HOST: &str = "TOOLBRIDGE_HOST";
/// Bind port override.
pub const ENV_PORT: &str = "TOOLBRIDGE_PORT";
/// Health endpoint server name override.
pub const ENV_SERVER_NAME: &str = "TOOLBRIDGE_SERVER_NAME";
/// Request body ceiling override.
pub const ENV_MAX_BODY_BYTES: &str = "TOOLBRIDGE_MAX_BODY_BYTES";
/// Client base URL override.
pub const ENV_BASE_URL: &str = "TOOLBRIDGE_BASE_URL";
/// Client timeout override, in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "TOOLBRIDGE_TIMEOUT_MS";

/// Loads configuration from an optional JSON file, then applies environment
/// overrides from the process environment.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed, an override is malformed, or
/// the resulting configuration does not validate.
pub fn load(path: Option<&Path>) -> Result<BridgeConfig> {
    let base = match path {
        Some(path) => from_json_file(path)?,
        None => BridgeConfig::default(),
    };
    apply_overrides(base, |key| std::env::var(key).ok())
}

/// Reads a JSON configuration document; missing fields take their defaults.
///
/// # Errors
///
/// Fails when the file cannot be read or is not valid JSON for the schema.
pub fn from_json_file(path: &Path) -> Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: BridgeConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}

/// Applies `TOOLBRIDGE_*` overrides resolved through `lookup`.
///
/// # Errors
///
/// Fails when an override is malformed or the result does not validate.
pub fn apply_overrides<F>(mut config: BridgeConfig, lookup: F) -> Result<BridgeConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_HOST) {
        let host: IpAddr = host
            .trim()
            .parse()
            .with_context(|| format!("{ENV_HOST} must be an IP address, got `{host}`"))?;
        config.server = config.server.with_host(host);
    }

    if let Some(port) = lookup(ENV_PORT) {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("{ENV_PORT} must be a port number, got `{port}`"))?;
        config.server = config.server.with_port(port);
    }

    if let Some(name) = lookup(ENV_SERVER_NAME) {
        config.server = config.server.with_name(name.trim());
    }

    if let Some(limit) = lookup(ENV_MAX_BODY_BYTES) {
        let limit: usize = limit
            .trim()
            .parse()
            .with_context(|| format!("{ENV_MAX_BODY_BYTES} must be an integer, got `{limit}`"))?;
        config.server = config.server.with_max_body_bytes(limit);
    }

    if let Some(url) = lookup(ENV_BASE_URL) {
        config.client = config
            .client
            .with_base_url(&url)
            .with_context(|| format!("{ENV_BASE_URL} is invalid"))?;
    }

    if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
        let millis: u64 = timeout
            .trim()
            .parse()
            .with_context(|| format!("{ENV_TIMEOUT_MS} must be an integer, got `{timeout}`"))?;
        config.client = config.client.with_timeout(Duration::from_millis(millis));
    }

    config.server.validate().context("invalid server configuration")?;
    config.client.validate().context("invalid client configuration")?;
    Ok(config)
}
