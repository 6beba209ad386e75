//! Database entity definitions.
//!
//! Entities map directly to database rows.

pub mod config;
pub mod invited_team;
pub mod team;

pub use config::ConfigEntryEntity;
pub use invited_team::InvitedTeamEntity;
pub use team::TeamEntity;
