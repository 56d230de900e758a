/// Database models for Taskhive
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts provisioned from verified external identities
/// - `project`: Projects owned by a user
/// - `membership`: User-project relationships with roles
/// - `invitation`: Pending/accepted/declined project invitations
/// - `task`: Ordered tasks within a project
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::project::{Project, CreateProject};
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     name: "Website redesign".to_string(),
///     description: None,
///     color: "#6366f1".to_string(),
///     icon: "folder".to_string(),
///     owner_id: Uuid::new_v4(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod invitation;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;
