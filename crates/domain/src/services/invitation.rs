//! CSV import and export of the invitation list.
//!
//! Import reads `name,email` rows, checks each one against the registered
//! teams and the invitation list, and stores every accepted row in a single
//! commit. Export writes `team_name,team_email,token` rows ordered by id.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{ImportOutcome, InvitedTeam, NewInvitedTeam};
use crate::stores::{InvitedTeamStore, StoreError, TeamStore};

/// Header row of the exported CSV.
pub const EXPORT_HEADER: [&str; 3] = ["team_name", "team_email", "token"];

/// Reported when the final commit of an import is rejected by the store.
pub const IMPORT_SAVE_FAILED: &str = "Failed to save invitation list";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Errors raised while building the export.
#[derive(Debug, Error)]
pub enum InvitationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("CSV serialization failed: {0}")]
    Csv(String),
}

impl From<csv::Error> for InvitationError {
    fn from(err: csv::Error) -> Self {
        InvitationError::Csv(err.to_string())
    }
}

/// Rows accepted by validation but not yet committed.
#[derive(Debug, Default)]
pub struct ImportBatch {
    staged: Vec<NewInvitedTeam>,
    errors: Vec<String>,
}

impl ImportBatch {
    /// Rows that passed every check, in file order.
    pub fn staged(&self) -> &[NewInvitedTeam] {
        &self.staged
    }

    /// Diagnostics collected so far, in row order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn has_staged_name(&self, name: &str) -> bool {
        self.staged.iter().any(|team| team.name == name)
    }

    fn has_staged_email(&self, email: &str) -> bool {
        self.staged.iter().any(|team| team.email == email)
    }

    /// Stores every staged row in one commit and builds the outcome.
    ///
    /// A rejected commit stores nothing; the outcome then carries
    /// [`IMPORT_SAVE_FAILED`] and no success message.
    pub async fn commit(self, invited: &dyn InvitedTeamStore) -> ImportOutcome {
        let ImportBatch { staged, mut errors } = self;
        let mut messages = Vec::new();

        if staged.is_empty() {
            return ImportOutcome { messages, errors };
        }

        let count = staged.len();
        match invited.create_many(staged).await {
            Ok(created) => {
                info!(count = created.len(), "Invited teams imported");
                messages.push(format!(
                    "Succesfully added {} teams to invitation list",
                    created.len()
                ));
            }
            Err(e) => {
                warn!(error = %e, staged = count, "Invitation import commit failed");
                errors.push(IMPORT_SAVE_FAILED.to_string());
            }
        }

        ImportOutcome { messages, errors }
    }
}

/// Parses one physical line as a CSV row. A blank line has no fields.
fn parse_row(line: &str) -> Result<csv::StringRecord, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        record.clear();
    }
    Ok(record)
}

/// Parses and validates an uploaded CSV without storing anything.
///
/// Line numbers count every line of the upload, blank ones included.
///
/// Every two-field row runs all six checks and reports each failure. The
/// "already invited" checks also see rows staged earlier in the same file.
pub async fn validate_csv(
    data: &[u8],
    invited: &dyn InvitedTeamStore,
    teams: &dyn TeamStore,
) -> Result<ImportBatch, StoreError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let text = String::from_utf8_lossy(data);

    let mut batch = ImportBatch::default();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let record = match parse_row(raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(line, error = %e, "Unreadable invitation CSV row");
                batch
                    .errors
                    .push(format!("Invalid number of fields on line {}", line));
                continue;
            }
        };

        match record.len() {
            0 => continue,
            2 => {}
            _ => {
                batch
                    .errors
                    .push(format!("Invalid number of fields on line {}", line));
                continue;
            }
        }

        let name = record[0].to_string();
        let email = record[1].to_string();
        let errors_before = batch.errors.len();

        if shared::validation::validate_team_name(&name).is_err() {
            batch.errors.push(format!("Invalid team name on line {}", line));
        }
        if shared::validation::validate_team_email(&email).is_err() {
            batch.errors.push(format!("Invalid email on line {}", line));
        }
        if teams.exists_by_name(&name).await? {
            batch
                .errors
                .push(format!("Already registered team name on line {}", line));
        }
        if teams.exists_by_email(&email).await? {
            batch
                .errors
                .push(format!("Already registered email on line {}", line));
        }
        if batch.has_staged_name(&name) || invited.find_by_name(&name).await?.is_some() {
            batch
                .errors
                .push(format!("Already invited team name on line {}", line));
        }
        if batch.has_staged_email(&email) || invited.find_by_email(&email).await?.is_some() {
            batch
                .errors
                .push(format!("Already invited email on line {}", line));
        }

        if batch.errors.len() == errors_before {
            debug!(line, name = %name, "Staged invited team");
            batch
                .staged
                .push(NewInvitedTeam::with_generated_token(name, email));
        }
    }

    Ok(batch)
}

/// Validates an uploaded CSV and commits the accepted rows.
pub async fn import_csv(
    data: &[u8],
    invited: &dyn InvitedTeamStore,
    teams: &dyn TeamStore,
) -> Result<ImportOutcome, StoreError> {
    let batch = validate_csv(data, invited, teams).await?;
    Ok(batch.commit(invited).await)
}

/// Serializes invited teams, in the given order, as CSV bytes.
pub fn write_csv(teams: &[InvitedTeam]) -> Result<Vec<u8>, InvitationError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;
    for team in teams {
        writer.write_record([&team.name, &team.email, &team.token])?;
    }
    writer
        .into_inner()
        .map_err(|e| InvitationError::Csv(e.to_string()))
}

/// Exports the whole invitation list ordered by ascending id.
pub async fn export_csv(invited: &dyn InvitedTeamStore) -> Result<Vec<u8>, InvitationError> {
    let teams = invited.list_all().await?;
    write_csv(&teams)
}

/// Download name of the exported list.
pub fn export_filename(ctf_name: &str) -> String {
    format!("{}-invited-teams.csv", ctf_name)
}
