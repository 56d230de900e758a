/// User profile endpoints
///
/// # Endpoints
///
/// - `GET /api/users/me` - The authenticated user's profile
/// - `GET /api/users/:id` - Public summary of any user
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use taskhive_shared::auth::middleware::AuthContext;
use taskhive_shared::models::user::{User, UserSummary};
use uuid::Uuid;

/// Current user endpoint
///
/// Returns the profile of the user the session token belongs to.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid session
/// - `404 Not Found`: The session's user no longer exists
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserSummary>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.summary()))
}

/// Get user by id endpoint
///
/// Returns the public summary of any registered user.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid session
/// - `404 Not Found`: No user with this id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserSummary>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.summary()))
}
