/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (pool + embedded migrations)
/// - Test user provisioning through the real login path
/// - Session token minting
/// - A router wired to a static identity verifier

use sqlx::PgPool;
use std::sync::Arc;
use taskhive_api::app::{build_router, AppState};
use taskhive_api::config::{
    ApiConfig, Config, DatabaseConfig, IdentityConfig, RealtimeConfig, SessionSettings,
};
use taskhive_shared::auth::identity::{StaticVerifier, VerifiedIdentity};
use taskhive_shared::auth::session::issue_session;
use taskhive_shared::models::user::User;
use taskhive_shared::realtime::ProjectHub;
use uuid::Uuid;

/// Identity token the static verifier accepts for the context's user
pub const IDENTITY_TOKEN: &str = "test-identity-token";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub session_token: String,
    /// The hub behind `app`, for observing realtime subscriptions
    pub hub: Arc<ProjectHub>,
}

impl TestContext {
    /// Creates a new test context with a fresh user and router
    ///
    /// Requires `DATABASE_URL` to point at a running PostgreSQL instance.
    pub async fn new() -> anyhow::Result<Self> {
        let config = test_config()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../taskhive-shared/migrations")
            .run(&db)
            .await?;

        // Provision the test user through the real login path
        let identity = unique_identity("owner");
        let user = User::login_or_register(&db, &identity).await?;

        let session = issue_session(
            &config.session_config(),
            user.id,
            &user.email,
            &user.display_name,
        )?;

        let verifier = StaticVerifier::new().with_token(IDENTITY_TOKEN, identity);
        let state = AppState::new(db.clone(), config.clone(), Arc::new(verifier));
        let hub = state.hub.clone();
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            session_token: session.token,
            hub,
        })
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.session_token)
    }

    /// Registers another user and mints a session for them
    pub async fn register_user(&self, label: &str) -> anyhow::Result<(User, String)> {
        let user = User::login_or_register(&self.db, &unique_identity(label)).await?;

        let session = issue_session(
            &self.config.session_config(),
            user.id,
            &user.email,
            &user.display_name,
        )?;

        Ok((user, session.token))
    }

    /// Deletes a user created during the test; owned projects cascade
    pub async fn delete_user(&self, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Cleans up test data
    ///
    /// Deleting the context's user cascades their projects, which in turn
    /// cascade members, invitations, and tasks. Extra users registered by a
    /// test must be deleted after this, once their task rows are gone.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        self.delete_user(self.user.id).await
    }
}

fn unique_identity(label: &str) -> VerifiedIdentity {
    let nonce = Uuid::new_v4();
    VerifiedIdentity {
        external_uid: format!("uid-{label}-{nonce}"),
        email: format!("{label}-{nonce}@example.com"),
        display_name: Some(format!("Test {label}")),
        avatar_url: None,
    }
}

/// Helper to wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout_secs: u64) -> anyhow::Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_secs);

    loop {
        if condition().await {
            return Ok(());
        }

        if start.elapsed() > timeout {
            anyhow::bail!("Condition not met within {} seconds", timeout_secs);
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }
}

/// Builds a config for tests; only the database URL comes from the
/// environment so the suite needs no other setup.
fn test_config() -> anyhow::Result<Config> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set for integration tests"))?;

    Ok(Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url,
            max_connections: 5,
        },
        session: SessionSettings {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            issuer: "taskhive".to_string(),
            audience: "taskhive".to_string(),
            ttl_minutes: 60,
        },
        identity: IdentityConfig {
            verify_url: "http://127.0.0.1:9099/accounts:lookup".to_string(),
            api_key: None,
        },
        realtime: RealtimeConfig {
            channel_capacity: 16,
        },
    })
}
