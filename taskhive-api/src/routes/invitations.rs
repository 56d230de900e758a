/// Invitation and member endpoints
///
/// Invitations move through pending -> accepted | declined exactly once.
/// Accept and decline are guarded writes: a stale or forged id changes
/// nothing and reports not-found.
///
/// # Endpoints
///
/// - `GET /api/invitations` - Pending invitations for the current user
/// - `POST /api/invitations/:id/accept` - Accept (adds membership)
/// - `POST /api/invitations/:id/decline` - Decline
/// - `POST /api/projects/:id/invitations` - Invite a user by email
/// - `GET /api/projects/:id/members` - List project members
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhive_shared::auth::middleware::AuthContext;
use taskhive_shared::models::invitation::{Invitation, InvitationDetails};
use taskhive_shared::models::membership::{MemberEntry, ProjectMember};
use uuid::Uuid;
use validator::Validate;

/// Send invitation request
#[derive(Debug, Deserialize, Validate)]
pub struct SendInvitationRequest {
    /// Email of the registered user to invite
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Message-only response for accept/decline
#[derive(Debug, Serialize)]
pub struct InvitationActionResponse {
    pub message: String,
}

/// List pending invitations endpoint
///
/// Returns the current user's pending invitations, newest first, enriched
/// with project and user summaries.
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<InvitationDetails>>> {
    let invitations = Invitation::list_pending_for_user(&state.db, auth.user_id).await?;
    Ok(Json(invitations))
}

/// Accept invitation endpoint
///
/// Adds the caller as a project member and marks the invitation accepted,
/// in one transaction.
///
/// # Errors
///
/// - `404 Not Found`: Unknown id, someone else's invitation, or already
///   responded
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<Json<InvitationActionResponse>> {
    let accepted = Invitation::accept(&state.db, invitation_id, auth.user_id).await?;

    if !accepted {
        return Err(ApiError::NotFound(
            "Invitation not found or already responded".to_string(),
        ));
    }

    tracing::info!(invitation_id = %invitation_id, user_id = %auth.user_id, "Invitation accepted");

    Ok(Json(InvitationActionResponse {
        message: "Invitation accepted".to_string(),
    }))
}

/// Decline invitation endpoint
///
/// # Errors
///
/// - `404 Not Found`: Unknown id, someone else's invitation, or already
///   responded
pub async fn decline_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<Json<InvitationActionResponse>> {
    let declined = Invitation::decline(&state.db, invitation_id, auth.user_id).await?;

    if !declined {
        return Err(ApiError::NotFound(
            "Invitation not found or already responded".to_string(),
        ));
    }

    tracing::info!(invitation_id = %invitation_id, user_id = %auth.user_id, "Invitation declined");

    Ok(Json(InvitationActionResponse {
        message: "Invitation declined".to_string(),
    }))
}

/// Send invitation endpoint
///
/// Invites a registered user (by email) to the project. Only the owner and
/// admin members may invite.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email, unknown email, target already owner
///   or member
/// - `403 Forbidden`: Caller may not invite to this project
/// - `404 Not Found`: Project does not exist
/// - `409 Conflict`: Target already has a pending invitation
pub async fn send_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<SendInvitationRequest>,
) -> ApiResult<(StatusCode, Json<InvitationDetails>)> {
    req.validate()?;

    let invitation = Invitation::invite(&state.db, project_id, &req.email, auth.user_id).await?;

    tracing::info!(
        invitation_id = %invitation.id,
        project_id = %project_id,
        invited_by = %auth.user_id,
        "Invitation sent"
    );

    Ok((StatusCode::CREATED, Json(invitation)))
}

/// List members endpoint
///
/// Returns the project's members with the owner prepended. Callers without
/// access receive an empty list rather than a rejection, so membership of a
/// project they cannot see never leaks.
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberEntry>>> {
    let members = ProjectMember::list_for_project(&state.db, project_id, auth.user_id).await?;
    Ok(Json(members))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_invitation_request_validates_email() {
        let req = SendInvitationRequest {
            email: "not-an-email".to_string(),
        };
        assert!(req.validate().is_err());

        let req = SendInvitationRequest {
            email: "teammate@example.com".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
