//! # Taskhive Shared Library
//!
//! This crate contains the domain logic shared by the Taskhive API server:
//! database models with their SQL operations, session issuing and validation,
//! the identity-provider boundary, project authorization, and the realtime
//! fan-out hub.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Sessions, identity verification, and authorization
//! - `db`: Connection pool and migrations
//! - `realtime`: Per-project broadcast hub for task events

pub mod auth;
pub mod db;
pub mod models;
pub mod realtime;

/// Current version of the Taskhive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
