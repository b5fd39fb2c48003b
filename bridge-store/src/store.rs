//! In-memory store shared by the sample handlers.

use tokio::sync::RwLock;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::record::{AppSettings, Summary, Task, TaskStatus, User};

/// Initial contents of a [`DataStore`].
#[derive(Clone, Debug)]
pub struct StoreSeed {
    /// Seed users.
    pub users: Vec<User>,
    /// Seed tasks.
    pub tasks: Vec<Task>,
    /// Application settings.
    pub settings: AppSettings,
}

impl StoreSeed {
    /// Reference data: three users, one task per status.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            users: vec![
                User::new(1, "Alice", "alice@example.com", "admin"),
                User::new(2, "Bob", "bob@example.com", "user"),
                User::new(3, "Charlie", "charlie@example.com", "user"),
            ],
            tasks: vec![
                Task {
                    id: 1,
                    title: "Implement MCP".to_owned(),
                    status: TaskStatus::Completed,
                    assigned_to: 1,
                },
                Task {
                    id: 2,
                    title: "Create client".to_owned(),
                    status: TaskStatus::InProgress,
                    assigned_to: 2,
                },
                Task {
                    id: 3,
                    title: "Write tests".to_owned(),
                    status: TaskStatus::Pending,
                    assigned_to: 3,
                },
            ],
            settings: AppSettings {
                app_name: "MCP Sample Application".to_owned(),
                version: "1.0.0".to_owned(),
                debug: true,
            },
        }
    }
}

#[derive(Debug)]
struct StoreInner {
    users: Vec<User>,
    tasks: Vec<Task>,
    settings: AppSettings,
    next_task_id: u64,
}

/// Users, tasks and settings behind a single reader/writer lock.
///
/// Task ids come from a monotonic counter that starts one past the largest
/// seeded id (or at 1) and only advances under the write lock, so ids are
/// never reused or duplicated.
#[derive(Debug)]
pub struct DataStore {
    inner: RwLock<StoreInner>,
}

impl DataStore {
    /// Creates a store from the supplied seed.
    #[must_use]
    pub fn new(seed: StoreSeed) -> Self {
        let next_task_id = seed
            .tasks
            .iter()
            .map(|task| task.id)
            .max()
            .map_or(1, |max| max.saturating_add(1));

        Self {
            inner: RwLock::new(StoreInner {
                users: seed.users,
                tasks: seed.tasks,
                settings: seed.settings,
                next_task_id,
            }),
        }
    }

    /// Creates a store holding [`StoreSeed::sample`].
    #[must_use]
    pub fn sample() -> Self {
        Self::new(StoreSeed::sample())
    }

    /// Returns all users in insertion order.
    pub async fn users(&self) -> Vec<User> {
        self.inner.read().await.users.clone()
    }

    /// Returns the user with the supplied id.
    pub async fn user(&self, id: i64) -> Option<User> {
        let guard = self.inner.read().await;
        guard.users.iter().find(|user| user.id == id).cloned()
    }

    /// Returns tasks, optionally restricted to those whose status spells `status`.
    ///
    /// An unknown status yields an empty list rather than an error.
    pub async fn tasks(&self, status: Option<&str>) -> Vec<Task> {
        let guard = self.inner.read().await;
        guard
            .tasks
            .iter()
            .filter(|task| status.is_none_or(|wanted| task.status.as_str() == wanted))
            .cloned()
            .collect()
    }

    /// Returns a copy of the application settings.
    pub async fn settings(&self) -> AppSettings {
        self.inner.read().await.settings.clone()
    }

    /// Returns aggregate counts over users and tasks.
    pub async fn summary(&self) -> Summary {
        let guard = self.inner.read().await;
        let count = |status: TaskStatus| {
            guard
                .tasks
                .iter()
                .filter(|task| task.status == status)
                .count()
        };

        Summary {
            users_count: guard.users.len(),
            tasks_count: guard.tasks.len(),
            completed_tasks: count(TaskStatus::Completed),
            pending_tasks: count(TaskStatus::Pending),
            in_progress_tasks: count(TaskStatus::InProgress),
            application: guard.settings.app_name.clone(),
        }
    }

    /// Creates a pending task assigned to an existing user.
    ///
    /// The assignee check, id assignment and append happen under one write
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownUser`] if `assigned_to` does not exist and
    /// [`StoreError::IdExhausted`] if the id counter cannot advance.
    pub async fn create_task(&self, title: String, assigned_to: i64) -> StoreResult<Task> {
        let mut guard = self.inner.write().await;
        if !guard.users.iter().any(|user| user.id == assigned_to) {
            return Err(StoreError::UnknownUser(assigned_to));
        }

        let id = guard.next_task_id;
        guard.next_task_id = id.checked_add(1).ok_or(StoreError::IdExhausted)?;

        let task = Task {
            id,
            title,
            status: TaskStatus::Pending,
            assigned_to,
        };
        guard.tasks.push(task.clone());
        info!(task_id = id, assigned_to, "task created");
        Ok(task)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::sample()
    }
}
