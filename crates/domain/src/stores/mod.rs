//! Storage contracts consumed by the registration services.
//!
//! The invited team table is owned by this service. Teams and the key/value
//! config belong to the host platform and are only reached through the
//! narrow traits below, so handlers can be driven by the PostgreSQL
//! repositories in production and by [`memory`] stores in tests.

pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{InvitedTeam, NewInvitedTeam, NewTeam, Team};

pub use memory::{MemoryConfigStore, MemoryInvitedTeamStore, MemoryTeamStore};

/// Errors reported by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the offending field.
    #[error("Unique constraint violated on {0}")]
    UniqueViolation(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

/// Persistence contract for invited teams.
///
/// Every mutating call commits before returning. `name`, `email` and `token`
/// are unique across the whole table.
#[async_trait]
pub trait InvitedTeamStore: Send + Sync {
    /// Inserts one invited team.
    async fn create(&self, team: NewInvitedTeam) -> Result<InvitedTeam, StoreError>;

    /// Inserts a batch in a single commit. Either every row is stored or none.
    async fn create_many(&self, teams: Vec<NewInvitedTeam>)
        -> Result<Vec<InvitedTeam>, StoreError>;

    /// Lists every invited team ordered by ascending id.
    async fn list_all(&self) -> Result<Vec<InvitedTeam>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<InvitedTeam>, StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<InvitedTeam>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<InvitedTeam>, StoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<InvitedTeam>, StoreError>;

    /// Deletes one invited team, returning the number of removed rows.
    async fn delete_by_id(&self, id: i64) -> Result<u64, StoreError>;

    /// Deletes every invited team, returning the number of removed rows.
    async fn delete_all(&self) -> Result<u64, StoreError>;
}

/// The host platform's team accounts.
#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Creates a team. The store hashes the password.
    async fn create(&self, team: NewTeam) -> Result<Team, StoreError>;

    async fn exists_by_name(&self, name: &str) -> Result<bool, StoreError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Names of every registered team.
    async fn list_names(&self) -> Result<HashSet<String>, StoreError>;
}

/// The host platform's string key/value configuration.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
