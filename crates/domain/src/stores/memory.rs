//! In-process stores.
//!
//! They enforce the same unique constraints as the PostgreSQL schema and are
//! used by the test suites and by local runs without a database.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{ConfigStore, InvitedTeamStore, StoreError, TeamStore};
use crate::models::{InvitedTeam, NewInvitedTeam, NewTeam, Team};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
}

#[derive(Debug, Default)]
struct InvitedTable {
    next_id: i64,
    rows: BTreeMap<i64, InvitedTeam>,
}

impl InvitedTable {
    fn conflict(&self, team: &NewInvitedTeam) -> Option<&'static str> {
        self.rows.values().find_map(|row| {
            if row.name == team.name {
                Some("name")
            } else if row.email == team.email {
                Some("email")
            } else if row.token == team.token {
                Some("token")
            } else {
                None
            }
        })
    }

    fn insert(&mut self, team: NewInvitedTeam) -> InvitedTeam {
        self.next_id += 1;
        let row = InvitedTeam {
            id: self.next_id,
            name: team.name,
            email: team.email,
            token: team.token,
        };
        self.rows.insert(row.id, row.clone());
        row
    }
}

/// In-memory [`InvitedTeamStore`].
#[derive(Debug, Default)]
pub struct MemoryInvitedTeamStore {
    table: RwLock<InvitedTable>,
}

impl MemoryInvitedTeamStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_where(
        &self,
        predicate: impl Fn(&InvitedTeam) -> bool,
    ) -> Result<Option<InvitedTeam>, StoreError> {
        Ok(read(&self.table)?.rows.values().find(|row| predicate(*row)).cloned())
    }
}

#[async_trait]
impl InvitedTeamStore for MemoryInvitedTeamStore {
    async fn create(&self, team: NewInvitedTeam) -> Result<InvitedTeam, StoreError> {
        let mut table = write(&self.table)?;
        if let Some(field) = table.conflict(&team) {
            return Err(StoreError::UniqueViolation(field.to_string()));
        }
        Ok(table.insert(team))
    }

    async fn create_many(
        &self,
        teams: Vec<NewInvitedTeam>,
    ) -> Result<Vec<InvitedTeam>, StoreError> {
        let mut table = write(&self.table)?;

        // Validate the whole batch before touching the table.
        let mut names = HashSet::new();
        let mut emails = HashSet::new();
        let mut tokens = HashSet::new();
        for team in &teams {
            if let Some(field) = table.conflict(team) {
                return Err(StoreError::UniqueViolation(field.to_string()));
            }
            if !names.insert(team.name.as_str()) {
                return Err(StoreError::UniqueViolation("name".to_string()));
            }
            if !emails.insert(team.email.as_str()) {
                return Err(StoreError::UniqueViolation("email".to_string()));
            }
            if !tokens.insert(team.token.as_str()) {
                return Err(StoreError::UniqueViolation("token".to_string()));
            }
        }

        Ok(teams.into_iter().map(|team| table.insert(team)).collect())
    }

    async fn list_all(&self) -> Result<Vec<InvitedTeam>, StoreError> {
        Ok(read(&self.table)?.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<InvitedTeam>, StoreError> {
        Ok(read(&self.table)?.rows.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<InvitedTeam>, StoreError> {
        self.find_where(|row| row.token == token)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<InvitedTeam>, StoreError> {
        self.find_where(|row| row.email == email)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<InvitedTeam>, StoreError> {
        self.find_where(|row| row.name == name)
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64, StoreError> {
        Ok(write(&self.table)?.rows.remove(&id).map_or(0, |_| 1))
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut table = write(&self.table)?;
        let removed = table.rows.len() as u64;
        table.rows.clear();
        Ok(removed)
    }
}

#[derive(Debug, Default)]
struct TeamTable {
    next_id: i64,
    rows: BTreeMap<i64, (Team, String)>,
}

/// In-memory [`TeamStore`]. Passwords are kept as Argon2id hashes.
#[derive(Debug, Default)]
pub struct MemoryTeamStore {
    table: RwLock<TeamTable>,
}

impl MemoryTeamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored password hash of a team, if the team exists.
    pub fn password_hash(&self, name: &str) -> Option<String> {
        let table = self.table.read().ok()?;
        table
            .rows
            .values()
            .find(|(team, _)| team.name == name)
            .map(|(_, hash)| hash.clone())
    }

    /// Every stored team, ordered by id.
    pub fn teams(&self) -> Vec<Team> {
        self.table
            .read()
            .map(|table| table.rows.values().map(|(team, _)| team.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TeamStore for MemoryTeamStore {
    async fn create(&self, team: NewTeam) -> Result<Team, StoreError> {
        let hash = shared::password::hash_password(&team.password)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut table = write(&self.table)?;
        for (row, _) in table.rows.values() {
            if row.name == team.name {
                return Err(StoreError::UniqueViolation("name".to_string()));
            }
            if row.email == team.email {
                return Err(StoreError::UniqueViolation("email".to_string()));
            }
        }

        table.next_id += 1;
        let created = Team {
            id: table.next_id,
            name: team.name,
            email: team.email,
            admin: false,
            verified: false,
        };
        table.rows.insert(created.id, (created.clone(), hash));
        Ok(created)
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool, StoreError> {
        Ok(read(&self.table)?
            .rows
            .values()
            .any(|(team, _)| team.name == name))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(read(&self.table)?
            .rows
            .values()
            .any(|(team, _)| team.email == email))
    }

    async fn list_names(&self) -> Result<HashSet<String>, StoreError> {
        Ok(read(&self.table)?
            .rows
            .values()
            .map(|(team, _)| team.name.clone())
            .collect())
    }
}

/// In-memory [`ConfigStore`].
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with the given pairs.
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(read(&self.values)?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        write(&self.values)?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
