//! Config entry entity (database row mapping).

use sqlx::FromRow;

/// Database row mapping for the config table.
#[derive(Debug, Clone, FromRow)]
pub struct ConfigEntryEntity {
    pub key: String,
    pub value: Option<String>,
}
