/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `SESSION_SECRET`: Secret key for session token signing (required)
/// - `SESSION_ISSUER` / `SESSION_AUDIENCE`: Claim pins (default: taskhive)
/// - `SESSION_TTL_MINUTES`: Session lifetime (default: 60)
/// - `IDENTITY_VERIFY_URL`: Identity provider's token lookup endpoint (required)
/// - `IDENTITY_API_KEY`: Provider API key appended as a query parameter (optional)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or "*" (default: *)
/// - `HUB_CHANNEL_CAPACITY`: Events buffered per project channel (default: 256)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use taskhive_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```
use serde::{Deserialize, Serialize};
use std::env;

use taskhive_shared::auth::session::SessionConfig;
use taskhive_shared::realtime::DEFAULT_CHANNEL_CAPACITY;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session token configuration
    pub session: SessionSettings,

    /// Identity provider configuration
    pub identity: IdentityConfig,

    /// Realtime hub configuration
    pub realtime: RealtimeConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins ("*" means permissive)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Secret key for session signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Issuer claim pinned into every token
    pub issuer: String,

    /// Audience claim pinned into every token
    pub audience: String,

    /// Session lifetime in minutes
    pub ttl_minutes: i64,
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Provider token lookup endpoint
    pub verify_url: String,

    /// Provider API key (appended as `?key=` when set)
    pub api_key: Option<String>,
}

/// Realtime hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Events buffered per project channel before slow clients lag
    pub channel_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    ///
    /// # Example
    ///
    /// ```no_run
    /// use taskhive_api::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_env()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET environment variable is required"))?;

        if session_secret.len() < 32 {
            anyhow::bail!("SESSION_SECRET must be at least 32 characters long");
        }

        let session_issuer = env::var("SESSION_ISSUER").unwrap_or_else(|_| "taskhive".to_string());
        let session_audience =
            env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "taskhive".to_string());
        let session_ttl_minutes = env::var("SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i64>()?;

        let identity_verify_url = env::var("IDENTITY_VERIFY_URL")
            .map_err(|_| anyhow::anyhow!("IDENTITY_VERIFY_URL environment variable is required"))?;
        let identity_api_key = env::var("IDENTITY_API_KEY").ok();

        let channel_capacity = env::var("HUB_CHANNEL_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_CHANNEL_CAPACITY.to_string())
            .parse::<usize>()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            session: SessionSettings {
                secret: session_secret,
                issuer: session_issuer,
                audience: session_audience,
                ttl_minutes: session_ttl_minutes,
            },
            identity: IdentityConfig {
                verify_url: identity_verify_url,
                api_key: identity_api_key,
            },
            realtime: RealtimeConfig { channel_capacity },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Returns the session config the shared auth layer expects
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            secret: self.session.secret.clone(),
            issuer: self.session.issuer.clone(),
            audience: self.session.audience.clone(),
            ttl_minutes: self.session.ttl_minutes,
        }
    }
}
