/// Database layer for Taskhive
///
/// This module provides connection pooling and the embedded migration runner.
/// Models live in the `models` module at the crate root.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::from_env()?).await?;
///     Ok(())
/// }
/// ```
pub mod migrations;
pub mod pool;
