//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `BACKEND_DATABASE_URL` - content database (falls back to `DATABASE_URL`)
//! - `STOREFRONT_DATABASE_URL` - session database (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Content migrations: `crates/backend/migrations/`
//! Session migrations: `crates/storefront/migrations/`

use emporium_backend::BackendConfig;
use emporium_storefront::StorefrontConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the content backend migrations (`cms` schema).
///
/// # Errors
///
/// Returns `MigrationError` if the configuration is incomplete, the database
/// is unreachable or a migration fails.
pub async fn backend() -> Result<(), MigrationError> {
    let config = BackendConfig::from_env().map_err(|e| MigrationError::Config(e.to_string()))?;

    tracing::info!("Connecting to content database...");
    let pool = emporium_backend::db::create_pool(&config.database_url).await?;

    tracing::info!("Running backend migrations...");
    sqlx::migrate!("../backend/migrations").run(&pool).await?;

    tracing::info!("Backend migrations complete");
    Ok(())
}

/// Run the storefront migrations (session table).
///
/// # Errors
///
/// Returns `MigrationError` if the configuration is incomplete, the database
/// is unreachable or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let config =
        StorefrontConfig::from_env().map_err(|e| MigrationError::Config(e.to_string()))?;

    tracing::info!("Connecting to session database...");
    let pool = emporium_storefront::db::create_pool(&config.database_url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}
