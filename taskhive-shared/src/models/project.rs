/// Project model and database operations
///
/// Every project has exactly one owner. The owner is never a row in
/// `project_members` but is treated as admin-equivalent everywhere;
/// authorization lives in [`crate::auth::access`]. Reads visible to owner or
/// member; renaming, archiving, and deletion are owner-only.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description VARCHAR(500),
///     color VARCHAR(20) NOT NULL DEFAULT '#3b82f6',
///     icon VARCHAR(50) NOT NULL DEFAULT 'folder',
///     is_archived BOOLEAN NOT NULL DEFAULT FALSE,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::UserSummary;

const PROJECT_COLUMNS: &str =
    "id, name, description, color, icon, is_archived, owner_id, created_at, updated_at";

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID (UUID v4)
    pub id: Uuid,

    /// Project name (≤100 chars)
    pub name: String,

    /// Optional description (≤500 chars)
    pub description: Option<String>,

    /// Display color, an opaque string for clients (e.g. "#3b82f6")
    pub color: String,

    /// Display icon name, opaque for clients
    pub icon: String,

    /// Archived projects are hidden from listings but not deleted
    pub is_archived: bool,

    /// The single owning user
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub owner_id: Uuid,
}

/// Input for updating a project; only provided fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_archived: Option<bool>,
}

/// Project enriched for client payloads: ownership relative to the acting
/// user, an owner summary, and the live task count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_owner: bool,
    pub owner: UserSummary,
    pub task_count: i64,
}

/// Flat row behind [`ProjectDetails`]; joins are done in SQL, never via
/// entity back-references
#[derive(Debug, sqlx::FromRow)]
struct ProjectDetailsRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    color: String,
    icon: String,
    is_archived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_owner: bool,
    owner_id: Uuid,
    owner_email: String,
    owner_display_name: String,
    owner_avatar_url: Option<String>,
    task_count: i64,
}

impl From<ProjectDetailsRow> for ProjectDetails {
    fn from(row: ProjectDetailsRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            color: row.color,
            icon: row.icon,
            is_archived: row.is_archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_owner: row.is_owner,
            owner: UserSummary {
                id: row.owner_id,
                email: row.owner_email,
                display_name: row.owner_display_name,
                avatar_url: row.owner_avatar_url,
            },
            task_count: row.task_count,
        }
    }
}

const DETAILS_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.color, p.icon, p.is_archived,
           p.created_at, p.updated_at,
           (p.owner_id = $1) AS is_owner,
           u.id AS owner_id, u.email AS owner_email,
           u.display_name AS owner_display_name, u.avatar_url AS owner_avatar_url,
           (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count
    FROM projects p
    JOIN users u ON u.id = p.owner_id
"#;

impl Project {
    /// Creates a project owned by `data.owner_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist (foreign key) or the
    /// database connection fails.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, color, icon, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.color)
        .bind(data.icon)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID with no authorization check
    ///
    /// Callers that act on behalf of a user should prefer
    /// [`Project::details_for_user`] or go through `auth::access`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Fetches one project, enriched, visible to owner or member
    ///
    /// Absent and forbidden collapse to `None` so existence does not leak.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn details_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectDetails>, sqlx::Error> {
        let row = sqlx::query_as::<_, ProjectDetailsRow>(&format!(
            r#"
            {DETAILS_SELECT}
            WHERE p.id = $2
              AND (p.owner_id = $1 OR EXISTS (
                  SELECT 1 FROM project_members m
                  WHERE m.project_id = p.id AND m.user_id = $1
              ))
            "#,
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(ProjectDetails::from))
    }

    /// Lists the union of owned and member-of projects for a user
    ///
    /// Archived projects are excluded; the join deduplicates by id; newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProjectDetails>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectDetailsRow>(&format!(
            r#"
            {DETAILS_SELECT}
            WHERE p.is_archived = FALSE
              AND (p.owner_id = $1 OR EXISTS (
                  SELECT 1 FROM project_members m
                  WHERE m.project_id = p.id AND m.user_id = $1
              ))
            ORDER BY p.created_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(ProjectDetails::from).collect())
    }

    /// Updates a project; only the owner's writes match
    ///
    /// Returns `None` when the project does not exist or the caller is not
    /// its owner; the two cases are indistinguishable.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.color.is_some() {
            bind_count += 1;
            query.push_str(&format!(", color = ${}", bind_count));
        }
        if data.icon.is_some() {
            bind_count += 1;
            query.push_str(&format!(", icon = ${}", bind_count));
        }
        if data.is_archived.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_archived = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND owner_id = $2 RETURNING {PROJECT_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id).bind(user_id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }
        if let Some(icon) = data.icon {
            q = q.bind(icon);
        }
        if let Some(is_archived) = data.is_archived {
            q = q.bind(is_archived);
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// Deletes a project; owner-only, cascades to tasks, members, and
    /// invitations
    ///
    /// Returns false when nothing matched (absent or not the owner).
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
