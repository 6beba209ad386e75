//! HTTP route handlers.

pub mod health;
pub mod invited_teams;
pub mod register;
