//! Embedding task models: lifecycle state, durable record, status DTO.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an embedding task.
///
/// Transitions: `Initialized -> Running -> {Completed | Failed}`; a task
/// becomes terminal exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Initialized,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Initialized => write!(f, "initialized"),
            TaskState::Running => write!(f, "running"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// The persisted shape of a task, keyed by task id in both the in-process
/// map and the durable store. Serialized as JSON in the durable store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub progress: f64,
    pub status: TaskState,
    pub estimated_time_left: f64,
}

impl TaskRecord {
    /// Fresh record for a just-created task.
    pub fn initialized() -> Self {
        Self {
            progress: 0.0,
            status: TaskState::Initialized,
            estimated_time_left: 0.0,
        }
    }
}

/// Status DTO returned to pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub progress: f64,
    pub status: TaskState,
    pub estimated_time_left: f64,
}

impl TaskStatus {
    pub fn from_record(task_id: impl Into<String>, record: &TaskRecord) -> Self {
        Self {
            task_id: task_id.into(),
            progress: record.progress,
            status: record.status,
            estimated_time_left: record.estimated_time_left,
        }
    }
}

/// Input DTO for starting an embedding task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub texts: Vec<String>,
}
