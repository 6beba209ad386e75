//! Repository for invited team database operations.

use async_trait::async_trait;
use domain::models::{InvitedTeam, NewInvitedTeam};
use domain::stores::{InvitedTeamStore, StoreError};
use sqlx::PgPool;

use super::store_error;
use crate::entities::InvitedTeamEntity;
use crate::metrics::QueryTimer;

/// Repository for invited team operations.
#[derive(Clone)]
pub struct InvitedTeamRepository {
    pool: PgPool,
}

impl InvitedTeamRepository {
    /// Creates a new invited team repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        query_name: &str,
        sql: &str,
        value: &str,
    ) -> Result<Option<InvitedTeam>, StoreError> {
        let timer = QueryTimer::new(query_name);
        let result = sqlx::query_as::<_, InvitedTeamEntity>(sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await;
        timer.observe(&result);

        Ok(result.map_err(store_error)?.map(Into::into))
    }

    /// Rolls back on the first failed insert when `tx` is dropped.
    async fn insert_batch(
        &self,
        teams: &[NewInvitedTeam],
    ) -> Result<Vec<InvitedTeamEntity>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(teams.len());

        for team in teams {
            let entity = sqlx::query_as::<_, InvitedTeamEntity>(
                r#"
                INSERT INTO invited_teams (name, email, token)
                VALUES ($1, $2, $3)
                RETURNING id, name, email, token, created_at
                "#,
            )
            .bind(&team.name)
            .bind(&team.email)
            .bind(&team.token)
            .fetch_one(&mut *tx)
            .await?;
            created.push(entity);
        }

        tx.commit().await?;
        Ok(created)
    }
}

#[async_trait]
impl InvitedTeamStore for InvitedTeamRepository {
    async fn create(&self, team: NewInvitedTeam) -> Result<InvitedTeam, StoreError> {
        let timer = QueryTimer::new("insert_invited_team");
        let result = sqlx::query_as::<_, InvitedTeamEntity>(
            r#"
            INSERT INTO invited_teams (name, email, token)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, token, created_at
            "#,
        )
        .bind(&team.name)
        .bind(&team.email)
        .bind(&team.token)
        .fetch_one(&self.pool)
        .await;
        timer.observe(&result);

        Ok(result.map_err(store_error)?.into())
    }

    /// Inserts the whole batch inside one transaction.
    async fn create_many(
        &self,
        teams: Vec<NewInvitedTeam>,
    ) -> Result<Vec<InvitedTeam>, StoreError> {
        let timer = QueryTimer::new("insert_invited_teams_batch");
        let result = self.insert_batch(&teams).await;
        timer.observe(&result);

        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<InvitedTeam>, StoreError> {
        let timer = QueryTimer::new("list_invited_teams");
        let result = sqlx::query_as::<_, InvitedTeamEntity>(
            r#"
            SELECT id, name, email, token, created_at
            FROM invited_teams
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.observe(&result);

        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<InvitedTeam>, StoreError> {
        let timer = QueryTimer::new("find_invited_team_by_id");
        let result = sqlx::query_as::<_, InvitedTeamEntity>(
            r#"
            SELECT id, name, email, token, created_at
            FROM invited_teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.observe(&result);

        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<InvitedTeam>, StoreError> {
        self.find_one(
            "find_invited_team_by_token",
            "SELECT id, name, email, token, created_at FROM invited_teams WHERE token = $1",
            token,
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<InvitedTeam>, StoreError> {
        self.find_one(
            "find_invited_team_by_email",
            "SELECT id, name, email, token, created_at FROM invited_teams WHERE email = $1",
            email,
        )
        .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<InvitedTeam>, StoreError> {
        self.find_one(
            "find_invited_team_by_name",
            "SELECT id, name, email, token, created_at FROM invited_teams WHERE name = $1",
            name,
        )
        .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("delete_invited_team");
        let result = sqlx::query("DELETE FROM invited_teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.observe(&result);

        Ok(result.map_err(store_error)?.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("delete_all_invited_teams");
        let result = sqlx::query("DELETE FROM invited_teams")
            .execute(&self.pool)
            .await;
        timer.observe(&result);

        Ok(result.map_err(store_error)?.rows_affected())
    }
}
