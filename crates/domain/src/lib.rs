//! Domain layer for the private registration service.
//!
//! This crate contains:
//! - Domain models (InvitedTeam, Team, RegistrationMode)
//! - Storage contracts and in-memory stores
//! - Business logic services (CSV import/export, registration, invitations)

pub mod models;
pub mod services;
pub mod stores;
