//! Connection pool and schema management.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use kairos_common::{KairosError, KairosResult};

use crate::schema::SCHEMA_SQL;
use crate::store::StoreHealth;

/// Shared PostgreSQL pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new pool from a database URL.
    pub async fn connect(database_url: &str, max_connections: u32) -> KairosResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| KairosError::DatabaseError(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> KairosResult<()> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| KairosError::DatabaseError(format!("Migration failed: {}", e)))?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl StoreHealth for Database {
    /// Round-trip a trivial query.
    async fn ping(&self) -> KairosResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| KairosError::DatabaseError(format!("Ping failed: {}", e)))?;
        Ok(())
    }
}
