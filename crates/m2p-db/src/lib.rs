//! m2p-db
//!
//! sqlx/MySQL implementations of the two repository seams: [`MesDb`] reads
//! the MES barcode registry, [`PlusDb`] reads and rewrites the PLUS serial
//! registries. Connection URLs come from the environment; everything else is
//! passed in explicitly, no process-wide state.

mod mes;
mod plus;

pub use mes::MesDb;
pub use plus::{PlusDb, ReimportTxn};

use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tracing::info;

pub const ENV_MES_DB_URL: &str = "M2P_MES_DATABASE_URL";
pub const ENV_PLUS_DB_URL: &str = "M2P_PLUS_DATABASE_URL";

/// Connect to the MES database using M2P_MES_DATABASE_URL.
pub async fn connect_mes_from_env() -> Result<MySqlPool> {
    connect_from_env(ENV_MES_DB_URL, "MES").await
}

/// Connect to the PLUS database using M2P_PLUS_DATABASE_URL.
pub async fn connect_plus_from_env() -> Result<MySqlPool> {
    connect_from_env(ENV_PLUS_DB_URL, "PLUS").await
}

async fn connect_from_env(env_key: &str, label: &str) -> Result<MySqlPool> {
    let url =
        std::env::var(env_key).with_context(|| format!("missing env var {env_key}"))?;

    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .with_context(|| format!("failed to connect to {label} database"))?;

    info!(db = label, "database connection established");
    Ok(pool)
}

/// Connectivity probe (used by `m2p db check`).
pub async fn ping(pool: &MySqlPool) -> Result<bool> {
    let (one,): (i64,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("connectivity probe failed")?;
    Ok(one == 1)
}
