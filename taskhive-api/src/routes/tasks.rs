/// Task endpoints
///
/// Nested list/create live under the owning project; item updates, deletes,
/// and bulk reorder address tasks directly. Every successful create, update,
/// and delete is fanned out to the project's realtime channel so connected
/// boards refresh without polling.
///
/// # Endpoints
///
/// - `GET /api/projects/:id/tasks` - List tasks in sort order
/// - `POST /api/projects/:id/tasks` - Create a task in the project
/// - `PUT /api/tasks/:id` - Partially update a task
/// - `DELETE /api/tasks/:id` - Delete a task
/// - `PUT /api/tasks/reorder` - Bulk reposition tasks
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskhive_shared::auth::middleware::AuthContext;
use taskhive_shared::models::task::{
    CreateTask, ReorderItem, Task, TaskDetails, TaskPriority, TaskStatus, UpdateTask,
};
use taskhive_shared::realtime::TaskEvent;
use uuid::Uuid;
use validator::Validate;

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Create task request; the project comes from the path, not the body
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Optional description
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// Priority (defaults to medium)
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// Optional initial assignee
    pub assigned_to: Option<Uuid>,
}

/// Update task request; only provided fields change
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub sort_order: Option<i32>,

    pub due_date: Option<DateTime<Utc>>,

    pub assigned_to: Option<Uuid>,
}

/// Bulk reorder request
#[derive(Debug, Deserialize)]
pub struct ReorderTasksRequest {
    /// New positions, applied per task the caller can access
    pub tasks: Vec<ReorderItem>,
}

/// List tasks endpoint
///
/// Returns the project's tasks ordered by `sort_order` (ties broken by
/// creation time), enriched with creator and assignee summaries. Callers
/// without access get an empty list rather than an error.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskDetails>>> {
    let tasks = Task::list_by_project(&state.db, project_id, auth.user_id).await?;
    Ok(Json(tasks))
}

/// Create task endpoint
///
/// The new task lands at the end of the project's ordering. Responds 201
/// and publishes `task.created` to the project's realtime channel.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Project absent, or the caller has no access
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskDetails>)> {
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id,
            title: req.title,
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
        },
        auth.user_id,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    tracing::info!(task_id = %task.id, project_id = %project_id, user_id = %auth.user_id, "Task created");

    state
        .hub
        .publish(project_id, TaskEvent::created(project_id, &task))
        .await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Update task endpoint
///
/// Moving the status into `done` stamps `completed_at`; moving it back out
/// clears the stamp. Publishes `task.updated` on success.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Task absent, or the caller has no access
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskDetails>> {
    req.validate()?;

    let task = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            sort_order: req.sort_order,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
        },
        auth.user_id,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task_id, user_id = %auth.user_id, "Task updated");

    state
        .hub
        .publish(task.project_id, TaskEvent::updated(task.project_id, &task))
        .await;

    Ok(Json(task))
}

/// Delete task endpoint
///
/// Responds 204 and publishes `task.deleted` with an id-only payload so
/// clients can drop the row without another fetch.
///
/// # Errors
///
/// - `404 Not Found`: Task absent, or the caller has no access
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    // Capture the owning project before the row disappears
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let deleted = Task::delete(&state.db, task_id, auth.user_id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task_id, user_id = %auth.user_id, "Task deleted");

    state
        .hub
        .publish(task.project_id, TaskEvent::deleted(task.project_id, task_id))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Bulk reorder endpoint
///
/// Applies each entry's new position. Entries for tasks the caller cannot
/// access are skipped so one stale id never fails the whole drag. Responds
/// 200 with an empty body.
pub async fn reorder_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ReorderTasksRequest>,
) -> ApiResult<StatusCode> {
    Task::reorder(&state.db, &req.tasks, auth.user_id).await?;

    tracing::info!(user_id = %auth.user_id, count = req.tasks.len(), "Tasks reordered");

    Ok(StatusCode::OK)
}
