/// User model and database operations
///
/// Users are created and kept current by the identity login flow: the first
/// successful verification creates the row, later logins update last-seen
/// and backfill missing profile fields. There is no password column; all
/// credentials live with the external identity provider.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     display_name VARCHAR(100) NOT NULL,
///     avatar_url VARCHAR(500),
///     external_uid VARCHAR(128) UNIQUE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::auth::identity::VerifiedIdentity;
/// use taskhive_shared::models::user::User;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let identity = VerifiedIdentity {
///     external_uid: "ext-uid-1".to_string(),
///     email: "user@example.com".to_string(),
///     display_name: Some("Jordan".to_string()),
///     avatar_url: None,
/// };
///
/// let user = User::login_or_register(&pool, &identity).await?;
/// println!("Logged in as {}", user.display_name);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::identity::VerifiedIdentity;

const USER_COLUMNS: &str = "id, email, display_name, avatar_url, external_uid, is_active, \
                            created_at, updated_at, last_login_at";

/// User account resolved from the external identity provider
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (case-insensitive via CITEXT), unique across all users
    pub email: String,

    /// Display name; defaults to the local part of the email when the
    /// identity provider supplies none
    pub display_name: String,

    /// Optional avatar/profile picture URL
    pub avatar_url: Option<String>,

    /// Identity-provider UID, unique when present
    ///
    /// May be absent for rows created before the provider link existed;
    /// the login flow backfills it on the first matching login by email.
    pub external_uid: Option<String>,

    /// Soft deactivation flag
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Compact user shape embedded in project, task, and invitation payloads
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

impl User {
    /// Resolves a verified identity to a user row, creating one if needed
    ///
    /// Lookup order: external UID first, then email. A row found by email
    /// without a UID gets the UID linked (the migration path for accounts
    /// that predate the provider link) and its avatar backfilled if missing.
    /// Every path stamps `last_login_at`.
    ///
    /// Concurrent first logins for the same identity are absorbed: the
    /// insert uses `ON CONFLICT DO NOTHING`, and the loser of the race
    /// retries as an update against the row the winner created.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `identity` - Attributes returned by the identity verifier
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable, or `RowNotFound` in
    /// the pathological case where the row vanishes between the lost insert
    /// race and the retry.
    pub async fn login_or_register(
        pool: &PgPool,
        identity: &VerifiedIdentity,
    ) -> Result<Self, sqlx::Error> {
        if let Some(user) = Self::find_and_touch(pool, identity).await? {
            return Ok(user);
        }

        let display_name = identity
            .display_name
            .clone()
            .unwrap_or_else(|| display_name_from_email(&identity.email));

        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, display_name, avatar_url, external_uid, last_login_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT DO NOTHING
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&identity.email)
        .bind(&display_name)
        .bind(&identity.avatar_url)
        .bind(&identity.external_uid)
        .fetch_optional(pool)
        .await?;

        if let Some(user) = inserted {
            tracing::info!(user_id = %user.id, "Registered new user");
            return Ok(user);
        }

        // Lost the insert race; the winner's row exists now, update it.
        Self::find_and_touch(pool, identity)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds the user for an identity and stamps their login
    ///
    /// Returns None when no row matches by UID or email.
    async fn find_and_touch(
        pool: &PgPool,
        identity: &VerifiedIdentity,
    ) -> Result<Option<Self>, sqlx::Error> {
        if let Some(user) = Self::find_by_external_uid(pool, &identity.external_uid).await? {
            let user = sqlx::query_as::<_, User>(&format!(
                r#"
                UPDATE users
                SET last_login_at = NOW(), updated_at = NOW()
                WHERE id = $1
                RETURNING {USER_COLUMNS}
                "#,
            ))
            .bind(user.id)
            .fetch_one(pool)
            .await?;
            return Ok(Some(user));
        }

        if let Some(user) = Self::find_by_email(pool, &identity.email).await? {
            // Link the provider UID and backfill the avatar if we have one
            // and the row does not.
            let user = sqlx::query_as::<_, User>(&format!(
                r#"
                UPDATE users
                SET external_uid = $2,
                    avatar_url = COALESCE(avatar_url, $3),
                    last_login_at = NOW(),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {USER_COLUMNS}
                "#,
            ))
            .bind(user.id)
            .bind(&identity.external_uid)
            .bind(&identity.avatar_url)
            .fetch_one(pool)
            .await?;
            tracing::info!(user_id = %user.id, "Linked existing account to identity provider");
            return Ok(Some(user));
        }

        Ok(None)
    }

    /// Finds a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by identity-provider UID
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn find_by_external_uid(
        pool: &PgPool,
        external_uid: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_uid = $1",
        ))
        .bind(external_uid)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Compact summary for embedding in other payloads
    pub fn summary(&self) -> UserSummary {
        UserSummary::from(self)
    }
}

/// Derives a display name from the local part of an email address
fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
