//! Tool and resource dispatch over HTTP.
//!
//! This crate bundles the workspace crates behind feature flags so
//! downstream users can pull in only the server side, only the client, or
//! both.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared identifiers and validated names.
pub use bridge_primitives as primitives;

/// Handler registry and parameter validation (enabled by `registry` feature).
#[cfg(feature = "registry")]
pub use bridge_registry as registry;

/// Dispatcher, wire bridge and server (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use bridge_kernel as kernel;

/// HTTP client (enabled by `client` feature).
#[cfg(feature = "client")]
pub use bridge_client as client;

/// Sample data store and tool catalog (enabled by `store` feature).
#[cfg(feature = "store")]
pub use bridge_store as store;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use bridge_config as config;

/// Tracing setup and health reports (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use bridge_telemetry as telemetry;
