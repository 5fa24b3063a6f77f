//! Storage Adapter (C1): a single PostgreSQL connection pool shared by every
//! other component. The platform is single-tenant — there is no
//! schema-per-tenant routing here, just one pool and one `public` schema.

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

/// Number of connection attempts before `Database::connect` gives up.
const MAX_CONNECT_ATTEMPTS: u32 = 10;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    acquire_timeout: Duration,
}

/// Point-in-time pool utilization, surfaced both as a metric
/// (`database_connections_active`) and in the `/api/v1/health/stack` detail.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct PoolStatus {
    pub active: u32,
    pub idle: u32,
    pub max: u32,
}

impl Database {
    /// Opens the pool, retrying with linear backoff (1s, 2s, ... capped at
    /// 10s) up to [`MAX_CONNECT_ATTEMPTS`] times before giving up. Startup
    /// should not fail just because Postgres is still coming up alongside it.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
                .connect(&config.url)
                .await;

            match result {
                Ok(pool) => {
                    info!(attempt, "database pool established");
                    return Ok(Self {
                        pool,
                        acquire_timeout: Duration::from_secs(config.acquire_timeout_seconds),
                    });
                }
                Err(err) if attempt < MAX_CONNECT_ATTEMPTS => {
                    let backoff = Duration::from_secs((attempt as u64).min(10));
                    warn!(attempt, error = %err, backoff_secs = backoff.as_secs(), "database connect failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    return Err(Error::internal("failed to establish database pool").with_source(err));
                }
            }
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `SELECT 1` plus a pool-size read, used by the Health Aggregator (C9)
    /// and the periodic readiness probe.
    pub async fn health(&self) -> Result<PoolStatus> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(self.pool_status())
    }

    pub fn pool_status(&self) -> PoolStatus {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        PoolStatus {
            active: size.saturating_sub(idle),
            idle,
            max: self.pool.options().get_max_connections(),
        }
    }

    /// Runs `body` inside a transaction, committing on `Ok` and rolling back
    /// on `Err`. A pool-acquisition timeout surfaces as `ErrorCode::ResourceBusy`
    /// rather than a generic internal error, per §7.
    pub async fn transaction<F, T>(&self, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(
                &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
            ) -> futures::future::BoxFuture<'c, Result<T>>
            + Send,
        T: Send,
    {
        let mut tx = tokio::time::timeout(self.acquire_timeout, self.pool.begin())
            .await
            .map_err(|_| Error::resource_busy("database pool exhausted"))??;

        let result = body(&mut tx).await;
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }
}
