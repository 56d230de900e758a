/// Authentication and authorization utilities
///
/// This module provides the security primitives for Taskhive:
///
/// # Modules
///
/// - [`identity`]: third-party identity verification boundary
/// - [`session`]: session token issuance and validation
/// - [`middleware`]: the `AuthContext` handed to request handlers
/// - [`access`]: project-level authorization (owner/member/admin)
///
/// # Security Features
///
/// - **No passwords**: identity is proved to a third-party provider; this
///   service never sees a credential it has to store
/// - **Session Tokens**: HS256 signing, issuer/audience pinned, zero leeway
/// - **Fail-closed Validation**: invalid tokens and rejected identities
///   surface one opaque error each
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::auth::session::{issue_session, validate_session, SessionConfig};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::new(std::env::var("SESSION_SECRET")?);
///
/// let session = issue_session(&config, Uuid::new_v4(), "ada@example.com", "Ada")?;
/// let claims = validate_session(&session.token, &config)?;
/// # Ok(())
/// # }
/// ```

pub mod access;
pub mod identity;
pub mod middleware;
pub mod session;
