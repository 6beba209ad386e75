//! Repository for the host team table.

use std::collections::HashSet;

use async_trait::async_trait;
use domain::models::{NewTeam, Team};
use domain::stores::{StoreError, TeamStore};
use sqlx::PgPool;

use super::store_error;
use crate::entities::TeamEntity;
use crate::metrics::QueryTimer;

/// Repository for team account operations.
#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, query_name: &str, sql: &str, value: &str) -> Result<bool, StoreError> {
        let timer = QueryTimer::new(query_name);
        let result: Result<bool, sqlx::Error> = sqlx::query_scalar(sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await;
        timer.observe(&result);

        result.map_err(store_error)
    }
}

#[async_trait]
impl TeamStore for TeamRepository {
    async fn create(&self, team: NewTeam) -> Result<Team, StoreError> {
        let password_hash = shared::password::hash_password(&team.password)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let timer = QueryTimer::new("insert_team");
        let result = sqlx::query_as::<_, TeamEntity>(
            r#"
            INSERT INTO teams (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, admin, verified, created_at
            "#,
        )
        .bind(&team.name)
        .bind(&team.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await;
        timer.observe(&result);

        Ok(result.map_err(store_error)?.into())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool, StoreError> {
        self.exists(
            "team_exists_by_name",
            "SELECT EXISTS(SELECT 1 FROM teams WHERE name = $1)",
            name,
        )
        .await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        self.exists(
            "team_exists_by_email",
            "SELECT EXISTS(SELECT 1 FROM teams WHERE email = $1)",
            email,
        )
        .await
    }

    async fn list_names(&self) -> Result<HashSet<String>, StoreError> {
        let timer = QueryTimer::new("list_team_names");
        let result: Result<Vec<String>, sqlx::Error> = sqlx::query_scalar("SELECT name FROM teams")
            .fetch_all(&self.pool)
            .await;
        timer.observe(&result);

        Ok(result.map_err(store_error)?.into_iter().collect())
    }
}
