//! Registration audit trail.
//!
//! Every completed registration emits one WARN event on the `regs` target so
//! it survives the default log filter. Operators route that target to its
//! own sink through the subscriber's `EnvFilter`.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Log target of registration audit events.
pub const AUDIT_TARGET: &str = "regs";

/// Kind of registration recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationEvent {
    /// Registered and immediately active.
    Registered,
    /// Registered but waiting for email confirmation.
    RegisteredUnconfirmed,
}

impl std::fmt::Display for RegistrationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationEvent::Registered => write!(f, "registered"),
            RegistrationEvent::RegisteredUnconfirmed => write!(f, "registered_unconfirmed"),
        }
    }
}

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationAuditEntry {
    pub event: RegistrationEvent,
    pub timestamp: DateTime<Utc>,
    pub team_name: String,
    pub email: String,
}

impl RegistrationAuditEntry {
    pub fn new(
        event: RegistrationEvent,
        team_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
            team_name: team_name.into(),
            email: email.into(),
        }
    }

    /// Human-readable line, e.g. `[10/19/2026 12:00:00] Team A registered with a@b.com`.
    pub fn summary(&self) -> String {
        let status = match self.event {
            RegistrationEvent::Registered => "registered",
            RegistrationEvent::RegisteredUnconfirmed => "registered (UNCONFIRMED)",
        };
        format!(
            "[{}] {} {} with {}",
            self.timestamp.format("%m/%d/%Y %X"),
            self.team_name,
            status,
            self.email
        )
    }

    /// Emits the entry on the audit target.
    pub fn emit(&self) {
        tracing::warn!(
            target: AUDIT_TARGET,
            event = %self.event,
            timestamp = %self.timestamp.to_rfc3339(),
            team_name = %self.team_name,
            email = %self.email,
            "{}",
            self.summary()
        );
    }
}
