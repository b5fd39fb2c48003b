//! Configuration management for toolbridge servers and clients.
//!
//! [`schema`] holds the strongly typed settings; [`loader`] layers a JSON file
//! and `TOOLBRIDGE_*` environment variables over the defaults.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use schema::{BridgeConfig, ClientConfig, ConfigError, ServerConfig};
