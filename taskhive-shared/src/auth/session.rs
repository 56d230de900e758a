/// Session token generation and validation
///
/// Logins are exchanged for a signed session token carrying the user's
/// identity. Tokens are signed using HS256 (HMAC-SHA256) and checked for
/// signature, expiration, issuer, and audience on every request.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable, default 60 minutes, no clock-skew leeway
/// - **Validation**: Fail-closed; every invalid token reports the same
///   opaque error so callers cannot probe why a token was rejected
/// - **Secret Management**: Secrets must be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::session::{issue_session, validate_session, SessionConfig};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::new("your-secret-key-at-least-32-bytes!!");
/// let user_id = Uuid::new_v4();
///
/// let session = issue_session(&config, user_id, "ada@example.com", "Ada")?;
///
/// let claims = validate_session(&session.token, &config)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped into and required from every session token
pub const DEFAULT_ISSUER: &str = "taskhive";

/// Audience claim stamped into and required from every session token
pub const DEFAULT_AUDIENCE: &str = "taskhive";

/// Session lifetime when the deployment does not override it
pub const DEFAULT_TTL_MINUTES: i64 = 60;

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to sign a new token
    #[error("Failed to create session token: {0}")]
    CreateError(String),

    /// The token failed validation
    ///
    /// Deliberately carries no detail. Expired, tampered, mis-issued, and
    /// malformed tokens are indistinguishable to the caller.
    #[error("Invalid session token")]
    Invalid,
}

/// Signing and validation parameters for session tokens
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC secret, at least 32 bytes
    pub secret: String,

    /// Expected `iss` claim
    pub issuer: String,

    /// Expected `aud` claim
    pub audience: String,

    /// Lifetime of newly issued tokens in minutes
    pub ttl_minutes: i64,
}

impl SessionConfig {
    /// Creates a config with the default issuer, audience, and lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }
}

/// Session token claims
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer
/// - `aud`: Audience
/// - `jti`: Unique token ID, fresh per issuance
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
///
/// # Custom Claims
///
/// - `email`: The user's email at issuance time
/// - `name`: The user's display name at issuance time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - User ID
    pub sub: Uuid,

    /// The user's email at issuance time
    pub email: String,

    /// The user's display name at issuance time
    pub name: String,

    /// Unique token ID
    pub jti: Uuid,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Creates claims expiring after the config's lifetime
    pub fn new(config: &SessionConfig, user_id: Uuid, email: &str, name: &str) -> Self {
        Self::with_ttl(
            config,
            user_id,
            email,
            name,
            Duration::minutes(config.ttl_minutes),
        )
    }

    /// Creates claims with an explicit lifetime
    ///
    /// # Example
    ///
    /// ```
    /// use taskhive_shared::auth::session::{SessionClaims, SessionConfig};
    /// use chrono::Duration;
    /// use uuid::Uuid;
    ///
    /// let config = SessionConfig::new("your-secret-key-at-least-32-bytes!!");
    /// let claims = SessionClaims::with_ttl(
    ///     &config,
    ///     Uuid::new_v4(),
    ///     "ada@example.com",
    ///     "Ada",
    ///     Duration::minutes(5),
    /// );
    /// ```
    pub fn with_ttl(
        config: &SessionConfig,
        user_id: Uuid,
        email: &str,
        name: &str,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + ttl;

        Self {
            sub: user_id,
            email: email.to_string(),
            name: name.to_string(),
            jti: Uuid::new_v4(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// A freshly issued session, ready for the login response
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    /// Signed session token
    pub token: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Signs a session token from claims
///
/// # Errors
///
/// Returns `SessionError::CreateError` if signing fails
pub fn create_session_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| SessionError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a session for a user who just proved their identity
///
/// # Errors
///
/// Returns `SessionError::CreateError` if signing fails
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::session::{issue_session, SessionConfig};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::new("your-secret-key-at-least-32-bytes!!");
/// let session = issue_session(&config, Uuid::new_v4(), "ada@example.com", "Ada")?;
/// assert!(!session.token.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn issue_session(
    config: &SessionConfig,
    user_id: Uuid,
    email: &str,
    name: &str,
) -> Result<IssuedSession, SessionError> {
    let claims = SessionClaims::new(config, user_id, email, name);
    let token = create_session_token(&claims, &config.secret)?;

    Ok(IssuedSession {
        token,
        expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
    })
}

/// Validates a session token and extracts its claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired (no leeway)
/// - Issuer and audience match the config
///
/// # Errors
///
/// Returns `SessionError::Invalid` for every failure; the reason is logged
/// at debug level but never surfaced to the caller.
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::session::{issue_session, validate_session, SessionConfig};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::new("your-secret-key-at-least-32-bytes!!");
/// let user_id = Uuid::new_v4();
///
/// let session = issue_session(&config, user_id, "ada@example.com", "Ada")?;
/// let claims = validate_session(&session.token, &config)?;
///
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(claims.email, "ada@example.com");
/// # Ok(())
/// # }
/// ```
pub fn validate_session(token: &str, config: &SessionConfig) -> Result<SessionClaims, SessionError> {
    let key = DecodingKey::from_secret(config.secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(reason = %e, "Session token rejected");
        SessionError::Invalid
    })?;

    Ok(token_data.claims)
}
