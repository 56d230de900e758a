/// Project endpoints
///
/// All routes require a session. Reads return projects the caller owns or
/// is a member of; absent and forbidden collapse into the same 404 so
/// project existence never leaks. Writes are owner-only.
///
/// # Endpoints
///
/// - `GET /api/projects` - List projects for the current user
/// - `POST /api/projects` - Create a project (caller becomes owner)
/// - `GET /api/projects/:id` - Get one project
/// - `PUT /api/projects/:id` - Update (owner only)
/// - `DELETE /api/projects/:id` - Delete (owner only, cascades)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhive_shared::auth::middleware::AuthContext;
use taskhive_shared::models::project::{CreateProject, Project, ProjectDetails, UpdateProject};
use uuid::Uuid;
use validator::Validate;

fn default_color() -> String {
    "#3b82f6".to_string()
}

fn default_icon() -> String {
    "folder".to_string()
}

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Optional description
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    /// Accent color (hex or named)
    #[serde(default = "default_color")]
    #[validate(length(max = 20, message = "Color must be at most 20 characters"))]
    pub color: String,

    /// Icon name
    #[serde(default = "default_icon")]
    #[validate(length(max = 50, message = "Icon must be at most 50 characters"))]
    pub icon: String,
}

/// Update project request; only provided fields change
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 20, message = "Color must be at most 20 characters"))]
    pub color: Option<String>,

    #[validate(length(max = 50, message = "Icon must be at most 50 characters"))]
    pub icon: Option<String>,

    pub is_archived: Option<bool>,
}

/// List projects endpoint
///
/// Returns every non-archived project the caller owns or belongs to,
/// newest first, enriched with owner summary and task count.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectDetails>>> {
    let projects = Project::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

/// Get project endpoint
///
/// # Errors
///
/// - `404 Not Found`: Project absent, or the caller has no access
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetails>> {
    let project = Project::details_for_user(&state.db, project_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Create project endpoint
///
/// The caller becomes the owner. Responds 201 with the enriched project.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectDetails>)> {
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            color: req.color,
            icon: req.icon,
            owner_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, user_id = %auth.user_id, "Project created");

    // The owner always has access, so the enriched row exists
    let details = Project::details_for_user(&state.db, project.id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Created project not readable".to_string()))?;

    Ok((StatusCode::CREATED, Json(details)))
}

/// Update project endpoint (owner only)
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Project absent, or the caller is not the owner
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectDetails>> {
    req.validate()?;

    let updated = Project::update(
        &state.db,
        project_id,
        auth.user_id,
        UpdateProject {
            name: req.name,
            description: req.description,
            color: req.color,
            icon: req.icon,
            is_archived: req.is_archived,
        },
    )
    .await?;

    if updated.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = %project_id, user_id = %auth.user_id, "Project updated");

    let details = Project::details_for_user(&state.db, project_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(details))
}

/// Delete project endpoint (owner only)
///
/// Cascades to members, invitations, and tasks. Responds 204.
///
/// # Errors
///
/// - `404 Not Found`: Project absent, or the caller is not the owner
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = Project::delete(&state.db, project_id, auth.user_id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = %project_id, user_id = %auth.user_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
