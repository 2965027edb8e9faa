use anyhow::{Context, Result};
use std::sync::Arc;

use crate::db::DbPool;

/// A dependency the service needs to be healthy
#[async_trait::async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check(&self) -> Result<()>;
}

pub struct PostgresProbe {
    pool: DbPool,
}

impl PostgresProbe {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HealthProbe for PostgresProbe {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("PostgreSQL did not answer")?;
        Ok(())
    }
}

pub struct RedisProbe {
    conn: redis::aio::ConnectionManager,
}

impl RedisProbe {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl HealthProbe for RedisProbe {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis did not answer")?;
        Ok(())
    }
}

/// Run every probe; the first failure is returned with the probe's name
pub async fn health_check(probes: &[Arc<dyn HealthProbe>]) -> Result<()> {
    for probe in probes {
        probe
            .check()
            .await
            .with_context(|| format!("{} health check failed", probe.name()))?;
    }
    Ok(())
}
