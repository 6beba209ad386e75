//! Invited team domain models.

use serde::{Deserialize, Serialize};

/// A team allowed to register, identified by a secret token or its email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitedTeam {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Input for creating an invited team. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitedTeam {
    pub name: String,
    pub email: String,
    pub token: String,
}

impl NewInvitedTeam {
    /// Creates a new invited team with a freshly generated token.
    pub fn with_generated_token(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            token: shared::crypto::generate_invitation_token(),
        }
    }
}

/// One entry of the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitedTeamSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub token: String,
    pub registered: bool,
}

impl InvitedTeamSummary {
    pub fn new(team: InvitedTeam, registered: bool) -> Self {
        Self {
            id: team.id,
            name: team.name,
            email: team.email,
            token: team.token,
            registered,
        }
    }
}

/// Response body of the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitedTeamListResponse {
    pub invited_teams: Vec<InvitedTeamSummary>,
}

/// Result of a CSV import: one optional summary message and every row error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ImportOutcome {
    pub messages: Vec<String>,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_generated_token() {
        let team = NewInvitedTeam::with_generated_token("Team A", "a@b.com");
        assert_eq!(team.name, "Team A");
        assert_eq!(team.email, "a@b.com");
        assert!(shared::crypto::is_invitation_token(&team.token));
    }

    #[test]
    fn test_summary_serialization() {
        let summary = InvitedTeamSummary::new(
            InvitedTeam {
                id: 3,
                name: "Team A".to_string(),
                email: "a@b.com".to_string(),
                token: "0123456789abcdef0123456789abcdef".to_string(),
            },
            true,
        );
        let json = serde_json::to_value(InvitedTeamListResponse {
            invited_teams: vec![summary],
        })
        .unwrap();

        assert_eq!(json["invited_teams"][0]["id"], 3);
        assert_eq!(json["invited_teams"][0]["name"], "Team A");
        assert_eq!(json["invited_teams"][0]["registered"], true);
    }

    #[test]
    fn test_import_outcome_serialization() {
        let outcome = ImportOutcome {
            messages: vec!["ok".to_string()],
            errors: vec![],
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"messages":["ok"],"errors":[]}"#);
    }
}
