//! Applies the order schema to the database named by `DATABASE_URL`.

use anyhow::Context;

use stockorder_infra::{EngineConfig, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("failed to load configuration")?;
    stockorder_observability::init_with(config.log_format);

    let database = config.require_database()?;
    let pool = db::connect(database)
        .await
        .context("failed to connect to the database")?;
    db::migrate(&pool).await.context("failed to apply the schema")?;

    tracing::info!(
        tax_rate = %config.tax_rate,
        inventory_policy = %config.inventory_policy,
        "database ready"
    );
    pool.close().await;
    Ok(())
}
