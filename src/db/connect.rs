// src/db/connect.rs
use anyhow::{Context, Result};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use log::info;
use std::env;
use tokio_postgres::NoTls;

pub type PgPool = Pool;

/// Builds a connection pool from POSTGRES_* environment variables.
pub async fn connect() -> Result<PgPool> {
    let mut cfg = Config::new();
    cfg.host = Some(env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string()));
    cfg.port = Some(
        env::var("POSTGRES_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5432),
    );
    cfg.user = Some(env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string()));
    cfg.password = env::var("POSTGRES_PASSWORD").ok();
    cfg.dbname = Some(env::var("POSTGRES_DB").unwrap_or_else(|_| "service_insights".to_string()));
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = cfg
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .context("Failed to create Postgres connection pool")?;

    // Fail fast on misconfiguration rather than at the first query.
    let conn = pool
        .get()
        .await
        .context("Failed to obtain an initial DB connection")?;
    conn.simple_query("SELECT 1")
        .await
        .context("Initial DB connectivity check failed")?;
    drop(conn);

    info!(
        "Connected to database '{}' at {}:{}",
        cfg.dbname.as_deref().unwrap_or_default(),
        cfg.host.as_deref().unwrap_or_default(),
        cfg.port.unwrap_or_default()
    );
    Ok(pool)
}
