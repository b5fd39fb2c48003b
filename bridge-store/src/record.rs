//! Records held by the data store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Role label, e.g. `admin`.
    pub role: String,
}

impl User {
    /// Creates a user record.
    #[must_use]
    pub fn new(
        id: i64,
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role: role.into(),
        }
    }
}

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Pending,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
}

impl TaskStatus {
    /// Wire spelling of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work assigned to a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique, never reused identifier.
    pub id: u64,
    /// Short title.
    pub title: String,
    /// Current status.
    pub status: TaskStatus,
    /// Identifier of the assignee.
    pub assigned_to: i64,
}

/// Application settings exposed through `data://config`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Human-readable application name.
    pub app_name: String,
    /// Application version string.
    pub version: String,
    /// Debug flag.
    pub debug: bool,
}

/// Aggregate counts exposed through `data://summary`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of users.
    pub users_count: usize,
    /// Number of tasks.
    pub tasks_count: usize,
    /// Tasks in [`TaskStatus::Completed`].
    pub completed_tasks: usize,
    /// Tasks in [`TaskStatus::Pending`].
    pub pending_tasks: usize,
    /// Tasks in [`TaskStatus::InProgress`].
    pub in_progress_tasks: usize,
    /// Application name from the settings.
    pub application: String,
}
