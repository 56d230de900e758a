/// Realtime task event types
///
/// This module defines the events fanned out to connected clients when tasks
/// change. Each event names the project it belongs to and carries a JSON
/// payload shaped for delivery as-is, so the transport layer never
/// re-serializes domain types.
///
/// # Payloads
///
/// - `task.created` / `task.updated`: the full enriched task, same shape as
///   the REST responses, so clients can upsert without a follow-up fetch.
/// - `task.deleted`: `{"id": "<task uuid>"}` only.
///
/// # Example
///
/// ```
/// use taskhive_shared::realtime::events::{TaskEvent, TaskEventKind};
/// use uuid::Uuid;
///
/// let event = TaskEvent::deleted(Uuid::new_v4(), Uuid::new_v4());
/// assert_eq!(event.event_type, TaskEventKind::Deleted);
/// assert_eq!(event.event_type.as_str(), "task.deleted");
/// ```
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::task::TaskDetails;

/// Event types fanned out when tasks change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskEventKind {
    /// A task was created in the project
    #[serde(rename = "task.created")]
    Created,

    /// A task's fields changed
    #[serde(rename = "task.updated")]
    Updated,

    /// A task was removed from the project
    #[serde(rename = "task.deleted")]
    Deleted,
}

impl TaskEventKind {
    /// Converts kind to its wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskEventKind::Created => "task.created",
            TaskEventKind::Updated => "task.updated",
            TaskEventKind::Deleted => "task.deleted",
        }
    }
}

/// A task change event scoped to one project channel
///
/// Serialized whole as the outbound frame. `project_id` rides along so a
/// client subscribed to several projects on one connection can route
/// `task.deleted` frames, whose payload carries only the task id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Project whose subscribers receive this event
    pub project_id: Uuid,

    /// What happened
    pub event_type: TaskEventKind,

    /// Event data (full task for created/updated, id only for deleted)
    pub payload: JsonValue,
}

impl TaskEvent {
    /// Event for a newly created task
    pub fn created(project_id: Uuid, task: &TaskDetails) -> Self {
        Self {
            project_id,
            event_type: TaskEventKind::Created,
            payload: serde_json::to_value(task).unwrap_or_default(),
        }
    }

    /// Event for a task whose fields changed
    pub fn updated(project_id: Uuid, task: &TaskDetails) -> Self {
        Self {
            project_id,
            event_type: TaskEventKind::Updated,
            payload: serde_json::to_value(task).unwrap_or_default(),
        }
    }

    /// Event for a deleted task. Only the id is sent.
    pub fn deleted(project_id: Uuid, task_id: Uuid) -> Self {
        Self {
            project_id,
            event_type: TaskEventKind::Deleted,
            payload: serde_json::json!({ "id": task_id }),
        }
    }
}
