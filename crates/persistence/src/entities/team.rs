//! Team entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Team;
use sqlx::FromRow;

/// Database row mapping for the teams table. The password hash is never
/// selected.
#[derive(Debug, Clone, FromRow)]
pub struct TeamEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub admin: bool,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TeamEntity> for Team {
    fn from(entity: TeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            admin: entity.admin,
            verified: entity.verified,
        }
    }
}
