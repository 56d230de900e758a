/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login endpoint (identity token exchange)
/// - `users`: User profile endpoints
/// - `projects`: Project CRUD endpoints
/// - `invitations`: Invitation and member endpoints
/// - `tasks`: Task CRUD and reorder endpoints
/// - `ws`: Realtime task feed over WebSocket

pub mod auth;
pub mod health;
pub mod invitations;
pub mod projects;
pub mod tasks;
pub mod users;
pub mod ws;
