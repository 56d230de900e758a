/// Authentication endpoint
///
/// This module provides the single login endpoint: an identity-provider
/// token is verified with the provider and exchanged for a taskhive session
/// token. There is no password flow; the provider is the only source of
/// identity.
///
/// # Endpoints
///
/// - `POST /api/auth/login` - Exchange an identity token for a session
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhive_shared::auth::session::issue_session;
use taskhive_shared::models::user::{User, UserSummary};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Identity token issued by the external provider
    #[validate(length(min = 1, message = "Identity token is required"))]
    pub token: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Session token for subsequent requests
    pub token: String,

    /// When the session token expires
    pub expires_at: DateTime<Utc>,

    /// The logged-in user
    pub user: UserSummary,
}

/// Login endpoint
///
/// Verifies the identity token with the provider, resolves (or registers)
/// the user, and issues a session token.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "token": "<identity provider token>"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "expires_at": "2025-06-10T13:00:00Z",
///   "user": {
///     "id": "uuid",
///     "email": "user@example.com",
///     "display_name": "User",
///     "avatar_url": null
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty token
/// - `401 Unauthorized`: Provider rejected the token
/// - `503 Service Unavailable`: Provider unreachable
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    // Verify with the identity provider; failures stay opaque to the client
    let identity = state.verifier.verify(&req.token).await?;

    let user = User::login_or_register(&state.db, &identity).await?;

    let session = issue_session(&state.session, user.id, &user.email, &user.display_name)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: user.summary(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_rejects_empty_token() {
        let req = LoginRequest {
            token: String::new(),
        };
        assert!(req.validate().is_err());

        let req = LoginRequest {
            token: "header.payload.signature".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
