/// Database migration runner
///
/// Migrations live in the `migrations/` directory of this crate and are
/// embedded into the binary by [`sqlx::migrate!`]. Each migration is a pair
/// of files: `{timestamp}_{name}.up.sql` and `{timestamp}_{name}.down.sql`.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::db::migrations::run_migrations;
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_env()?).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```
use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{info, warn};

/// Runs all pending migrations against the given pool
///
/// # Errors
///
/// Returns an error if a migration fails to apply; sqlx rolls the failed
/// migration back and records nothing for it.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Creates the database named in the URL if it does not exist
///
/// Useful for development and test environments; production databases are
/// provisioned out of band.
///
/// # Errors
///
/// Returns an error if the server is unreachable or the current role may not
/// create databases.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}
