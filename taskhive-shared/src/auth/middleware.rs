/// Authentication context for Axum handlers
///
/// The API's session middleware validates the bearer token and inserts an
/// [`AuthContext`] into request extensions; handlers extract it with Axum's
/// `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskhive_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.name)
/// }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::SessionClaims;

/// Identity of the authenticated session, added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email captured at session issuance
    pub email: String,

    /// Display name captured at session issuance
    pub name: String,
}

impl AuthContext {
    /// Creates auth context from validated session claims
    pub fn from_claims(claims: &SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            name: claims.name.clone(),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}
