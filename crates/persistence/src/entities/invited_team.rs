//! Invited team entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::InvitedTeam;
use sqlx::FromRow;

/// Database row mapping for the invited_teams table.
#[derive(Debug, Clone, FromRow)]
pub struct InvitedTeamEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl From<InvitedTeamEntity> for InvitedTeam {
    fn from(entity: InvitedTeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            token: entity.token,
        }
    }
}
