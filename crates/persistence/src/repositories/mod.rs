//! Repository implementations for database operations.
//!
//! Each repository implements one of the storage contracts from
//! `domain::stores` on top of PostgreSQL.

pub mod config;
pub mod invited_team;
pub mod team;

pub use config::ConfigRepository;
pub use invited_team::InvitedTeamRepository;
pub use team::TeamRepository;

use domain::stores::StoreError;

/// PostgreSQL error code for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a sqlx error onto the store contract. Unique violations carry the
/// constraint name.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::UniqueViolation(constraint);
        }
    }
    StoreError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_backend() {
        let err = store_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_pool_timeout_is_backend() {
        let err = store_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("timed out")));
    }
}
