//! Database adapters: connection pool construction and schema bootstrap.
//!
//! There is no process-wide connection helper. Callers build one pool and hand
//! clones of it to each Postgres component.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use crate::config::DatabaseConfig;
use crate::error::{StoreError, map_sqlx_error};

/// Create a Postgres connection pool.
#[instrument(skip(config), fields(max_connections = config.max_connections), err)]
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Apply pending migrations from `migrations/`. Idempotent.
#[instrument(skip(pool), err)]
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| match e {
            sqlx::migrate::MigrateError::Execute(err) => map_sqlx_error("migrate", err),
            other => StoreError::Backend(format!("migration failed: {other}")),
        })?;
    tracing::info!("schema is up to date");
    Ok(())
}
