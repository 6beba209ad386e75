//! Invitation-only registration.
//!
//! A submission resolves to an invited team by token or by email, depending
//! on the active mode, and creates the platform team when every check
//! passes. The invited record is left in place; reuse is blocked because the
//! team name is then taken.

use tracing::{debug, info};

use crate::models::{FormValues, InvitedTeam, NewTeam, RegistrationForm, RegistrationMode, Team};
use crate::services::audit::{RegistrationAuditEntry, RegistrationEvent};
use crate::services::notification::Mailer;
use crate::services::settings;
use crate::stores::{ConfigStore, InvitedTeamStore, StoreError, TeamStore};

pub const INVALID_TOKEN: &str = "Invalid token";
pub const EMAIL_NOT_INVITED: &str = "Your email is not invited";
pub const UNKNOWN_MODE: &str = "Something strange happened";
pub const ALREADY_REGISTERED: &str = "Already registered";
pub const PASSWORD_TOO_SHORT: &str = "Pick a longer password";
pub const PASSWORD_TOO_LONG: &str = "Pick a shorter password";

/// Where the team goes after a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Email verification is pending.
    ConfirmEmail,
    Challenges,
}

/// Result of a registration submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationResult {
    /// The form is shown again with every error and the submitted values.
    Rejected {
        mode: Option<RegistrationMode>,
        errors: Vec<String>,
        values: FormValues,
    },
    Registered {
        team: Team,
        next: NextStep,
        audit: RegistrationAuditEntry,
    },
}

impl RegistrationResult {
    pub fn errors(&self) -> &[String] {
        match self {
            RegistrationResult::Rejected { errors, .. } => errors,
            RegistrationResult::Registered { .. } => &[],
        }
    }
}

/// Collaborators of one registration.
pub struct RegistrationGate<'a> {
    pub invited: &'a dyn InvitedTeamStore,
    pub teams: &'a dyn TeamStore,
    pub config: &'a dyn ConfigStore,
    pub mailer: &'a dyn Mailer,
}

fn password_error(password: &str) -> Option<&'static str> {
    match shared::validation::validate_password_length(password) {
        Ok(()) => None,
        Err(e) if e.code == "password_too_long" => Some(PASSWORD_TOO_LONG),
        Err(_) => Some(PASSWORD_TOO_SHORT),
    }
}

fn form_values(mode: Option<RegistrationMode>, form: &RegistrationForm) -> FormValues {
    let password = Some(form.password.clone());
    match mode {
        Some(RegistrationMode::Token) => FormValues {
            token: form.token.clone(),
            email: None,
            password,
        },
        Some(RegistrationMode::Email) => FormValues {
            token: None,
            email: form.email.clone(),
            password,
        },
        None => FormValues::default(),
    }
}

impl RegistrationGate<'_> {
    async fn resolve(
        &self,
        mode: Option<RegistrationMode>,
        form: &RegistrationForm,
        errors: &mut Vec<String>,
    ) -> Result<Option<InvitedTeam>, StoreError> {
        match mode {
            Some(RegistrationMode::Token) => {
                let token = form.token.as_deref().unwrap_or_default();
                let found = self.invited.find_by_token(token).await?;
                if found.is_none() {
                    errors.push(INVALID_TOKEN.to_string());
                }
                Ok(found)
            }
            Some(RegistrationMode::Email) => {
                let email = form.email.as_deref().unwrap_or_default();
                let found = self.invited.find_by_email(email).await?;
                if found.is_none() {
                    errors.push(EMAIL_NOT_INVITED.to_string());
                }
                Ok(found)
            }
            None => {
                errors.push(UNKNOWN_MODE.to_string());
                Ok(None)
            }
        }
    }

    /// Checks a submission and, when valid, creates the team.
    pub async fn submit(&self, form: &RegistrationForm) -> Result<RegistrationResult, StoreError> {
        let mode = settings::registration_mode(self.config).await?;
        let mut errors = Vec::new();

        let invited = self.resolve(mode, form, &mut errors).await?;
        if let Some(team) = &invited {
            if self.teams.exists_by_name(&team.name).await? {
                errors.push(ALREADY_REGISTERED.to_string());
            }
        }
        if let Some(message) = password_error(&form.password) {
            errors.push(message.to_string());
        }

        let rejected = |errors: Vec<String>| RegistrationResult::Rejected {
            mode,
            errors,
            values: form_values(mode, form),
        };

        let invited = match invited {
            Some(team) if errors.is_empty() => team,
            _ => {
                debug!(errors = ?errors, "Registration rejected");
                return Ok(rejected(errors));
            }
        };

        let created = self
            .teams
            .create(NewTeam {
                name: invited.name.clone(),
                email: invited.email.to_lowercase(),
                password: form.password.clone(),
            })
            .await;
        let team = match created {
            Ok(team) => team,
            Err(e) if e.is_unique_violation() => {
                info!(team_name = %invited.name, "Concurrent registration lost the race");
                return Ok(rejected(vec![ALREADY_REGISTERED.to_string()]));
            }
            Err(e) => return Err(e),
        };

        let can_mail = self.mailer.can_send_mail();
        let (next, audit) = if can_mail && settings::verify_emails(self.config).await? {
            let audit = RegistrationAuditEntry::new(
                RegistrationEvent::RegisteredUnconfirmed,
                &invited.name,
                &invited.email,
            );
            audit.emit();
            self.mailer.send_verification(&team.email).await;
            (NextStep::ConfirmEmail, audit)
        } else {
            if can_mail {
                let ctf_name = settings::ctf_name(self.config).await?;
                let text = format!("You've successfully registered for {}", ctf_name);
                self.mailer.send_mail(&team.email, &text).await;
            }
            let audit = RegistrationAuditEntry::new(
                RegistrationEvent::Registered,
                &invited.name,
                &invited.email,
            );
            audit.emit();
            (NextStep::Challenges, audit)
        };

        Ok(RegistrationResult::Registered { team, next, audit })
    }
}
