//! Observability utilities for toolbridge processes.

#![warn(missing_docs, clippy::pedantic)]

pub mod health;
pub mod tracing_support;

pub use health::HealthReport;
