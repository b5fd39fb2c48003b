//! Health reporting utilities.

use serde::{Deserialize, Serialize};

/// Liveness payload returned by `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    status: String,
    server: String,
}

impl HealthReport {
    /// Builds a healthy report for the named server.
    #[must_use]
    pub fn healthy(server: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_owned(),
            server: server.into(),
        }
    }

    /// Returns the reported status.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the reporting server's name.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns `true` when the status is `healthy`.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
