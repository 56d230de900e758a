/// Task model and database operations
///
/// Tasks are the unit of work inside a project. Every read and write is
/// guarded by project access (owner or member); unauthorized reads come back
/// empty and unauthorized writes come back `None`/`false`, never revealing
/// whether the task exists.
///
/// Position within a project is the `sort_order` column. New tasks append at
/// `max(sort_order) + 1`; the read-then-insert runs under a per-project
/// advisory lock so concurrent creations serialize instead of colliding.
/// Reads order by `sort_order` with `created_at` breaking ties.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'in_review', 'done', 'cancelled');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(2000),
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     sort_order INTEGER NOT NULL DEFAULT 0,
///     due_date TIMESTAMPTZ,
///     completed_at TIMESTAMPTZ,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::task::{Task, CreateTask, TaskPriority};
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let me = Uuid::new_v4();
///
/// let task = Task::create(&pool, CreateTask {
///     project_id: Uuid::new_v4(),
///     title: "Write onboarding doc".to_string(),
///     description: None,
///     priority: TaskPriority::High,
///     due_date: None,
///     assigned_to: Some(me),
/// }, me).await?;
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::access;
use crate::models::user::UserSummary;

/// Column list shared by every plain task SELECT
const TASK_COLUMNS: &str = "id, title, description, status, priority, sort_order, \
     due_date, completed_at, project_id, created_by, assigned_to, created_at, updated_at";

/// Task rows joined with creator and assignee summaries
const DETAILS_SELECT: &str = r#"
SELECT t.id, t.title, t.description, t.status, t.priority, t.sort_order,
       t.due_date, t.completed_at, t.project_id, t.created_at, t.updated_at,
       cb.id AS cb_id, cb.email AS cb_email,
       cb.display_name AS cb_display_name, cb.avatar_url AS cb_avatar_url,
       au.id AS au_id, au.email AS au_email,
       au.display_name AS au_display_name, au.avatar_url AS au_avatar_url
FROM tasks t
JOIN users cb ON cb.id = t.created_by
LEFT JOIN users au ON au.id = t.assigned_to
"#;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Actively being worked on
    InProgress,

    /// Awaiting review
    InReview,

    /// Finished; `completed_at` is set while a task holds this status
    Done,

    /// Abandoned without completion
    Cancelled,
}

impl TaskStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// True for the status that carries a completion timestamp
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Converts priority to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// How an update affects `completed_at`, derived from the status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionChange {
    /// Entering done: stamp `completed_at = now()`
    Set,

    /// Leaving done: clear the stamp
    Clear,

    /// No boundary crossed: leave the stamp alone
    Keep,
}

fn completion_change(current: TaskStatus, target: TaskStatus) -> CompletionChange {
    match (current.is_done(), target.is_done()) {
        (false, true) => CompletionChange::Set,
        (true, false) => CompletionChange::Clear,
        _ => CompletionChange::Keep,
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title shown in lists
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Current workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Position within the project; ties broken by created_at
    pub sort_order: i32,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// Set while status is done, cleared when it leaves done
    pub completed_at: Option<DateTime<Utc>>,

    /// Project this task belongs to
    pub project_id: Uuid,

    /// User who created the task
    pub created_by: Uuid,

    /// Currently assigned user, if any
    pub assigned_to: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task enriched for client payloads with creator and assignee summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetails {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub sort_order: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub project_id: Uuid,
    pub assigned_to: Option<UserSummary>,
    pub created_by: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Project to create the task in
    pub project_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Priority (defaults to medium)
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// Optional initial assignee
    pub assigned_to: Option<Uuid>,
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Input for updating a task
///
/// All fields are optional. Only non-None fields will be updated, so a field
/// cannot be cleared back to NULL through this path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub sort_order: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
}

/// One entry of a bulk reorder request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderItem {
    /// Task to move
    pub id: Uuid,

    /// New position
    pub sort_order: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct TaskDetailsRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    sort_order: i32,
    due_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    project_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cb_id: Uuid,
    cb_email: String,
    cb_display_name: String,
    cb_avatar_url: Option<String>,
    au_id: Option<Uuid>,
    au_email: Option<String>,
    au_display_name: Option<String>,
    au_avatar_url: Option<String>,
}

impl From<TaskDetailsRow> for TaskDetails {
    fn from(row: TaskDetailsRow) -> Self {
        let assigned_to = row.au_id.map(|id| UserSummary {
            id,
            email: row.au_email.unwrap_or_default(),
            display_name: row.au_display_name.unwrap_or_default(),
            avatar_url: row.au_avatar_url,
        });

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            sort_order: row.sort_order,
            due_date: row.due_date,
            completed_at: row.completed_at,
            project_id: row.project_id,
            assigned_to,
            created_by: UserSummary {
                id: row.cb_id,
                email: row.cb_email,
                display_name: row.cb_display_name,
                avatar_url: row.cb_avatar_url,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Task {
    /// Creates a task appended at the end of the project's ordering
    ///
    /// Returns `None` when the acting user has no access to the project.
    /// The position read and the insert share a transaction holding the
    /// project's advisory lock, so two concurrent creates cannot pick the
    /// same `sort_order`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create(
        pool: &PgPool,
        data: CreateTask,
        user_id: Uuid,
    ) -> Result<Option<TaskDetails>, sqlx::Error> {
        if !access::authorize_access(pool, data.project_id, user_id).await? {
            return Ok(None);
        }

        let mut tx = pool.begin().await?;

        // Serializes appends per project; released at commit/rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(data.project_id.to_string())
            .execute(&mut *tx)
            .await?;

        let next_order: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM tasks WHERE project_id = $1",
        )
        .bind(data.project_id)
        .fetch_one(&mut *tx)
        .await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (title, description, priority, sort_order,
                               due_date, project_id, created_by, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority)
        .bind(next_order)
        .bind(data.due_date)
        .bind(data.project_id)
        .bind(user_id)
        .bind(data.assigned_to)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            task_id = %id,
            project_id = %data.project_id,
            sort_order = next_order,
            "Task created"
        );

        Self::find_details(pool, id).await
    }

    /// Finds a task by ID without an access check
    ///
    /// Internal reads and API handlers use this to locate the owning project
    /// before authorizing.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task =
            sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(task)
    }

    /// Finds a task by ID with creator and assignee summaries attached
    pub async fn find_details(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskDetails>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskDetailsRow>(&format!("{DETAILS_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(TaskDetails::from))
    }

    /// Lists a project's tasks in board order
    ///
    /// A caller without project access receives an empty list, the same
    /// response an empty project produces.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<TaskDetails>, sqlx::Error> {
        if !access::authorize_access(pool, project_id, user_id).await? {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TaskDetailsRow>(&format!(
            "{DETAILS_SELECT} WHERE t.project_id = $1 ORDER BY t.sort_order ASC, t.created_at ASC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(TaskDetails::from).collect())
    }

    /// Applies a partial update to a task
    ///
    /// Returns `None` when the task does not exist or the acting user has no
    /// access to its project. A status change crossing the done boundary
    /// maintains `completed_at`: entering done stamps it, leaving done clears
    /// it, anything else leaves it untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
        user_id: Uuid,
    ) -> Result<Option<TaskDetails>, sqlx::Error> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        if !access::authorize_access(pool, current.project_id, user_id).await? {
            return Ok(None);
        }

        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if let Some(status) = data.status {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));

            match completion_change(current.status, status) {
                CompletionChange::Set => query.push_str(", completed_at = NOW()"),
                CompletionChange::Clear => query.push_str(", completed_at = NULL"),
                CompletionChange::Keep => {}
            }
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.sort_order.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sort_order = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1");

        let mut q = sqlx::query(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(sort_order) = data.sort_order {
            q = q.bind(sort_order);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }

        let result = q.execute(pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_details(pool, id).await
    }

    /// Deletes a task
    ///
    /// Returns false when the task does not exist or the acting user has no
    /// access to its project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let Some(task) = Self::find_by_id(pool, id).await? else {
            return Ok(false);
        };

        if !access::authorize_access(pool, task.project_id, user_id).await? {
            return Ok(false);
        }

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies new positions to a batch of tasks, best effort
    ///
    /// Each item is authorized against its own project; items the acting
    /// user cannot touch, and IDs that no longer exist, are skipped without
    /// failing the batch. No atomicity across items is promised. Applied
    /// items refresh `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database connection fails; authorization
    /// misses are skips, not errors.
    pub async fn reorder(
        pool: &PgPool,
        items: &[ReorderItem],
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        for item in items {
            let project_id: Option<Uuid> =
                sqlx::query_scalar("SELECT project_id FROM tasks WHERE id = $1")
                    .bind(item.id)
                    .fetch_optional(pool)
                    .await?;

            let Some(project_id) = project_id else {
                continue;
            };

            if !access::authorize_access(pool, project_id, user_id).await? {
                tracing::debug!(task_id = %item.id, "Skipping reorder of inaccessible task");
                continue;
            }

            sqlx::query("UPDATE tasks SET sort_order = $2, updated_at = NOW() WHERE id = $1")
                .bind(item.id)
                .bind(item.sort_order)
                .execute(pool)
                .await?;
        }

        Ok(())
    }
}
