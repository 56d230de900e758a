/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhive_api::{app::AppState, config::Config};
/// use taskhive_shared::auth::identity::HttpIdentityVerifier;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let verifier = HttpIdentityVerifier::new(
///     config.identity.verify_url.clone(),
///     config.identity.api_key.clone(),
/// )?;
/// let state = AppState::new(pool, config, Arc::new(verifier));
/// let app = taskhive_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskhive_shared::auth::identity::IdentityVerifier;
use taskhive_shared::auth::middleware::{bearer_token, AuthContext};
use taskhive_shared::auth::session::{validate_session, SessionConfig};
use taskhive_shared::realtime::ProjectHub;

use crate::config::Config;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Session signing/validation parameters, prebuilt from config
    pub session: SessionConfig,

    /// Per-project realtime broadcast hub
    pub hub: Arc<ProjectHub>,

    /// Identity provider client
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, verifier: Arc<dyn IdentityVerifier>) -> Self {
        let session = config.session_config();
        let hub = Arc::new(ProjectHub::new(config.realtime.channel_capacity));
        Self {
            db,
            config: Arc::new(config),
            session,
            hub,
            verifier,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// The router is organized as follows:
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// ├── /ws/tasks                        # Realtime task feed (token in query)
/// └── /api/
///     ├── /auth/
///     │   └── POST /login              # Identity token -> session token
///     ├── /users/                      # (session required)
///     │   ├── GET /me
///     │   └── GET /:id
///     ├── /projects/                   # (session required)
///     │   ├── GET    /                 # List projects
///     │   ├── POST   /                 # Create project
///     │   ├── GET    /:id
///     │   ├── PUT    /:id
///     │   ├── DELETE /:id
///     │   ├── GET    /:id/members
///     │   ├── POST   /:id/invitations
///     │   ├── GET    /:id/tasks
///     │   └── POST   /:id/tasks
///     ├── /invitations/                # (session required)
///     │   ├── GET  /
///     │   ├── POST /:id/accept
///     │   └── POST /:id/decline
///     └── /tasks/                      # (session required)
///         ├── PUT    /reorder
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session authentication (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new().route("/login", post(routes::auth::login));

    // User routes (require session)
    let user_routes = Router::new()
        .route("/me", get(routes::users::current_user))
        .route("/:id", get(routes::users::get_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Project routes, including nested members/invitations/tasks (require session)
    let project_routes = Router::new()
        .route("/", get(routes::projects::list_projects))
        .route("/", post(routes::projects::create_project))
        .route("/:id", get(routes::projects::get_project))
        .route("/:id", put(routes::projects::update_project))
        .route("/:id", axum::routing::delete(routes::projects::delete_project))
        .route("/:id/members", get(routes::invitations::list_members))
        .route(
            "/:id/invitations",
            post(routes::invitations::send_invitation),
        )
        .route("/:id/tasks", get(routes::tasks::list_tasks))
        .route("/:id/tasks", post(routes::tasks::create_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Invitation routes (require session)
    let invitation_routes = Router::new()
        .route("/", get(routes::invitations::list_pending))
        .route("/:id/accept", post(routes::invitations::accept_invitation))
        .route(
            "/:id/decline",
            post(routes::invitations::decline_invitation),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Task routes (require session)
    let task_routes = Router::new()
        .route("/reorder", put(routes::tasks::reorder_tasks))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", axum::routing::delete(routes::tasks::delete_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Build complete /api surface
    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/invitations", invitation_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .route("/ws/tasks", get(routes::ws::tasks_feed))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Extracts and validates the session token from the Authorization header,
/// then injects AuthContext into request extensions.
async fn session_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    // Parse Bearer token
    let token = bearer_token(auth_header).ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    // Validate token
    let claims = validate_session(token, &state.session)?;

    // Create auth context
    let auth_context = AuthContext::from_claims(&claims);

    // Insert into request extensions
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
