//! Invitation mails.
//!
//! [`Mailer`] is the host mail capability: fire-and-forget sends that report
//! success as a boolean. The composer builds the plain-text invitation and
//! hands it to the mailer one recipient at a time.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::{InvitedTeam, RegistrationMode};
use crate::stores::{InvitedTeamStore, StoreError, TeamStore};

/// Mail capability of the host platform.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Whether a mail provider is configured at all.
    fn can_send_mail(&self) -> bool;

    /// Sends a plain-text message. Returns `false` when delivery failed.
    async fn send_mail(&self, to: &str, text: &str) -> bool;

    /// Sends the account verification link for `to`.
    async fn send_verification(&self, to: &str) -> bool;
}

/// Kind of a mail captured by [`RecordingMailer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentMailKind {
    Text,
    Verification,
}

/// One mail captured by [`RecordingMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub kind: SentMailKind,
    pub to: String,
    pub text: String,
}

/// Mailer for development and testing.
///
/// Records every message instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    /// Reported by `can_send_mail`.
    pub available: bool,
    /// Whether sends report failure.
    pub simulate_failure: bool,
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    /// A mailer with no provider configured.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// A configured mailer whose sends always fail.
    pub fn failing() -> Self {
        Self {
            available: true,
            simulate_failure: true,
            ..Default::default()
        }
    }

    /// Messages captured so far, in send order.
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    fn record(&self, kind: SentMailKind, to: &str, text: &str) -> bool {
        if !self.available || self.simulate_failure {
            warn!(to = %to, "Recording mailer simulating failure");
            return false;
        }
        match self.sent.lock() {
            Ok(mut sent) => {
                sent.push(SentMail {
                    kind,
                    to: to.to_string(),
                    text: text.to_string(),
                });
                true
            }
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn can_send_mail(&self) -> bool {
        self.available
    }

    async fn send_mail(&self, to: &str, text: &str) -> bool {
        self.record(SentMailKind::Text, to, text)
    }

    async fn send_verification(&self, to: &str) -> bool {
        self.record(SentMailKind::Verification, to, "")
    }
}

/// Values shared by every invitation of one send.
#[derive(Debug, Clone)]
pub struct InvitationContext {
    pub ctf_name: String,
    /// Absolute URL of the registration page.
    pub registration_url: String,
    /// Active mode. The token is only disclosed in token mode.
    pub mode: Option<RegistrationMode>,
}

/// Builds the invitation text for one team.
pub fn invitation_text(team: &InvitedTeam, ctx: &InvitationContext) -> String {
    let token_suffix = match ctx.mode {
        Some(RegistrationMode::Token) => format!(" with token {}", team.token),
        _ => String::new(),
    };
    format!(
        "Team {} ({}) is invited for {}. You can register in {}{}.",
        team.name, team.email, ctx.ctf_name, ctx.registration_url, token_suffix
    )
}

/// Outcome of a bulk send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendSummary {
    pub sent: usize,
    pub failed: usize,
    pub skipped_registered: usize,
}

/// Mails every invited team that has not registered yet.
///
/// Returns `None` without sending when the mailer is unavailable.
pub async fn send_invitation_to_all(
    invited: &dyn InvitedTeamStore,
    teams: &dyn TeamStore,
    mailer: &dyn Mailer,
    ctx: &InvitationContext,
) -> Result<Option<SendSummary>, StoreError> {
    if !mailer.can_send_mail() {
        warn!("Invitation mails requested but no mail provider is configured");
        return Ok(None);
    }

    let registered = teams.list_names().await?;
    let mut summary = SendSummary::default();

    for team in invited.list_all().await? {
        if registered.contains(&team.name) {
            summary.skipped_registered += 1;
            continue;
        }
        if mailer.send_mail(&team.email, &invitation_text(&team, ctx)).await {
            summary.sent += 1;
        } else {
            summary.failed += 1;
        }
    }

    info!(
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped_registered,
        "Invitation mails sent"
    );
    Ok(Some(summary))
}

/// Mails one invited team, registered or not.
///
/// Returns `false` for an unknown id or when the mailer is unavailable.
pub async fn send_invitation_to_one(
    id: i64,
    invited: &dyn InvitedTeamStore,
    mailer: &dyn Mailer,
    ctx: &InvitationContext,
) -> Result<bool, StoreError> {
    if !mailer.can_send_mail() {
        return Ok(false);
    }
    let Some(team) = invited.find_by_id(id).await? else {
        return Ok(false);
    };
    Ok(mailer.send_mail(&team.email, &invitation_text(&team, ctx)).await)
}
