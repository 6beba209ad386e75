//! Platform team models.
//!
//! Teams belong to the host platform. This service only creates them at the
//! end of a successful private registration and checks names for the
//! "already registered" rule.

use serde::Serialize;

/// A registered team account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub admin: bool,
    pub verified: bool,
}

/// Input for creating a team account.
#[derive(Clone)]
pub struct NewTeam {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for NewTeam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewTeam")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
