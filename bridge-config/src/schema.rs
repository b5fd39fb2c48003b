//! Strongly typed configuration schemas.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name reported by `/health` when none is configured.
pub const DEFAULT_SERVER_NAME: &str = "sample_mcp_server";
/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default ceiling for request bodies (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default client base URL.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
/// Default client request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Validation failures raised while building configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL did not use an HTTP scheme or was otherwise unusable.
    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
        /// Human-readable reason.
        reason: &'static str,
    },
    /// A numeric setting was zero where a positive value is required.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Settings for the HTTP server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    host: IpAddr,
    port: u16,
    name: String,
    max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            name: DEFAULT_SERVER_NAME.to_owned(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Overrides the bind host.
    #[must_use]
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Overrides the bind port. `0` asks the OS for a free port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the name reported by the health endpoint.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the request body ceiling.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Returns the bind host.
    #[must_use]
    pub const fn host(&self) -> IpAddr {
        self.host
    }

    /// Returns the bind port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the server name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the request body ceiling in bytes.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the name is blank or the body
    /// ceiling is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("server name cannot be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max body bytes must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Settings for the HTTP client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    base_url: String,
    timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Overrides the server base URL; trailing slashes are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when the scheme is not
    /// `http://` or `https://`.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the sanitized base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed or the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        sanitize_base_url(&self.base_url)?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Top-level configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Server settings.
    pub server: ServerConfig,
    /// Client settings.
    pub client: ClientConfig,
}

fn sanitize_base_url(input: &str) -> Result<String, ConfigError> {
    let base = input.trim().trim_end_matches('/');
    let rest = base
        .strip_prefix("http://")
        .or_else(|| base.strip_prefix("https://"))
        .ok_or_else(|| ConfigError::InvalidBaseUrl {
            url: input.to_owned(),
            reason: "base url must start with http:// or https://",
        })?;
    if rest.is_empty() {
        return Err(ConfigError::InvalidBaseUrl {
            url: input.to_owned(),
            reason: "base url is missing a host",
        });
    }
    Ok(base.to_owned())
}
