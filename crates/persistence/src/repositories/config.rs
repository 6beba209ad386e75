//! Repository for the host key/value configuration.

use async_trait::async_trait;
use domain::stores::{ConfigStore, StoreError};
use sqlx::PgPool;

use super::store_error;
use crate::entities::ConfigEntryEntity;
use crate::metrics::QueryTimer;

/// Repository for config entries.
#[derive(Clone)]
pub struct ConfigRepository {
    pool: PgPool,
}

impl ConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for ConfigRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let timer = QueryTimer::new("get_config");
        let result = sqlx::query_as::<_, ConfigEntryEntity>(
            r#"
            SELECT key, value
            FROM config
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.observe(&result);

        Ok(result.map_err(store_error)?.and_then(|entry| entry.value))
    }

    /// Upserts the entry.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let timer = QueryTimer::new("set_config");
        let result = sqlx::query(
            r#"
            INSERT INTO config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await;
        timer.observe(&result);

        result.map_err(store_error)?;
        Ok(())
    }
}
