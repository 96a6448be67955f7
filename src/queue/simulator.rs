//! Simulated background task queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::Clock;
use super::QueueConfig;

/// Lifecycle status of a queued task. Ordered so transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Waiting,
    Running,
    Done,
}

impl TaskStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Waiting | TaskStatus::Running)
    }
}

/// A queued unit of simulated work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub label: String,
    pub status: TaskStatus,
    /// Queue time at which the task was enqueued
    pub enqueued_at: Duration,
}

/// A deferred status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledTransition {
    task_id: String,
    status: TaskStatus,
    due: Duration,
}

/// A transition that was applied by [`TaskQueue::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub task_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Queue shared between the controller and the pump.
pub type SharedTaskQueue = Arc<Mutex<TaskQueue>>;

/// Append-only task list whose items advance on a schedule.
///
/// Each enqueue schedules two transitions measured from enqueue time:
/// `running` after `running_after`, `done` after `done_after`. Nothing
/// happens until [`poll`](TaskQueue::poll) observes the clock past a due
/// time, which keeps the queue deterministic under a manual clock.
#[derive(Debug)]
pub struct TaskQueue {
    config: QueueConfig,
    clock: Arc<dyn Clock>,
    tasks: Vec<Task>,
    pending: Vec<ScheduledTransition>,
}

impl TaskQueue {
    pub fn new(config: QueueConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            tasks: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedTaskQueue {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Add a waiting task and schedule its lifecycle. Returns the task id.
    pub fn enqueue(&mut self, label: impl Into<String>) -> String {
        let now = self.clock.now();
        let id = Uuid::new_v4().to_string();
        let label = label.into();

        tracing::debug!(task_id = %id, label = %label, "Task enqueued");
        self.tasks.push(Task {
            id: id.clone(),
            label,
            status: TaskStatus::Waiting,
            enqueued_at: now,
        });
        self.pending.push(ScheduledTransition {
            task_id: id.clone(),
            status: TaskStatus::Running,
            due: now + self.config.running_after(),
        });
        self.pending.push(ScheduledTransition {
            task_id: id.clone(),
            status: TaskStatus::Done,
            due: now + self.config.done_after(),
        });
        id
    }

    /// Move a task to `status`.
    ///
    /// Unknown ids and backward transitions are ignored. Returns the
    /// previous status when the task changed.
    pub fn set_status(&mut self, task_id: &str, status: TaskStatus) -> Option<TaskStatus> {
        let task = self.tasks.iter_mut().find(|task| task.id == task_id)?;
        if status <= task.status {
            return None;
        }
        let previous = task.status;
        task.status = status;
        tracing::debug!(task_id, ?previous, ?status, "Task status changed");
        Some(previous)
    }

    /// Apply every scheduled transition that is due.
    pub fn poll(&mut self) -> Vec<StatusChange> {
        let now = self.clock.now();
        let (mut due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|transition| transition.due <= now);
        self.pending = later;
        due.sort_by_key(|transition| (transition.due, transition.status));

        due.into_iter()
            .filter_map(|transition| {
                self.set_status(&transition.task_id, transition.status)
                    .map(|from| StatusChange {
                        task_id: transition.task_id,
                        from,
                        to: transition.status,
                    })
            })
            .collect()
    }

    /// True while any task is waiting or running.
    pub fn is_busy(&self) -> bool {
        self.tasks.iter().any(|task| task.status.is_active())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }
}
