//! Admin routes for the invitation list.
//!
//! Every handler sits behind the admin gate. Mutations answer with a plain
//! `"1"` on success and `"0"` on failure.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use axum_extra::extract::Multipart;
use domain::models::{InvitedTeamListResponse, InvitedTeamSummary, RegistrationMode};
use domain::stores::StoreError;
use domain::services::{
    export_csv, export_filename, send_invitation_to_all, send_invitation_to_one, settings,
    validate_csv, InvitationContext,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{metrics, AdminAuth};

/// Multipart field carrying the uploaded CSV.
pub const IMPORT_FIELD: &str = "invited_teams";

const SUCCESS: &str = "1";
const FAILURE: &str = "0";

fn status_text(ok: bool) -> &'static str {
    if ok {
        SUCCESS
    } else {
        FAILURE
    }
}

/// GET /admin/invited_teams/
pub async fn list_invited_teams(
    State(state): State<AppState>,
) -> Result<Json<InvitedTeamListResponse>, ApiError> {
    let registered = state.teams.list_names().await?;
    let invited_teams = state
        .invited
        .list_all()
        .await?
        .into_iter()
        .map(|team| {
            let is_registered = registered.contains(&team.name);
            InvitedTeamSummary::new(team, is_registered)
        })
        .collect();

    Ok(Json(InvitedTeamListResponse { invited_teams }))
}

/// POST /admin/invited_teams/delete/:id
pub async fn delete_invited_team(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminAuth>,
    Path(id): Path<i64>,
) -> &'static str {
    match state.invited.delete_by_id(id).await {
        Ok(deleted) => {
            info!(id, deleted, admin = %admin, "Invited team deleted");
            SUCCESS
        }
        Err(e) => {
            error!(id, error = %e, "Failed to delete invited team");
            FAILURE
        }
    }
}

/// POST /admin/invited_teams/delete/all
pub async fn delete_all_invited_teams(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminAuth>,
) -> &'static str {
    match state.invited.delete_all().await {
        Ok(deleted) => {
            info!(deleted, admin = %admin, "Invitation list cleared");
            SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Failed to clear invitation list");
            FAILURE
        }
    }
}

/// Strips characters that could break out of a Content-Disposition value.
fn attachment_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect()
}

/// GET /admin/invited_teams/export
pub async fn export_invited_teams(State(state): State<AppState>) -> Result<Response, ApiError> {
    let csv_bytes = export_csv(state.invited.as_ref()).await?;
    let ctf_name = settings::ctf_name(state.settings.as_ref()).await?;
    let filename = attachment_name(&export_filename(&ctf_name));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv_bytes,
    )
        .into_response())
}

/// POST /admin/invited_teams/import
///
/// Answers `"0"` when the upload has no `invited_teams` field.
pub async fn import_invited_teams(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminAuth>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Multipart read error: {e}")))?
    {
        if field.name() == Some(IMPORT_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read file: {e}")))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let Some(data) = file_data else {
        warn!("Import request without an invited_teams file");
        return Ok(FAILURE.into_response());
    };

    let batch = match validate_csv(&data, state.invited.as_ref(), state.teams.as_ref()).await {
        Ok(batch) => batch,
        Err(e) => {
            error!(error = %e, "Invitation import aborted");
            return Ok(FAILURE.into_response());
        }
    };
    let staged = batch.staged().len();
    let outcome = batch.commit(state.invited.as_ref()).await;

    if !outcome.messages.is_empty() {
        metrics::record_invitations_imported(staged);
    }
    metrics::record_import_errors(outcome.errors.len());
    info!(
        staged,
        errors = outcome.errors.len(),
        admin = %admin,
        "Invitation import finished"
    );

    Ok(Json(outcome).into_response())
}

/// Form of the mode switch.
#[derive(Debug, Deserialize)]
pub struct OptionForm {
    #[serde(default)]
    pub selected_option: Option<String>,
}

/// POST /admin/invited_teams/option
///
/// Stores the mode, swaps the registration template and drops cached pages.
pub async fn set_option(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminAuth>,
    Form(form): Form<OptionForm>,
) -> &'static str {
    state.render_cache.clear();

    let Some(selected) = form.selected_option.filter(|value| !value.is_empty()) else {
        return FAILURE;
    };
    let mode = match selected.parse::<RegistrationMode>() {
        Ok(mode) => mode,
        Err(e) => {
            warn!(error = %e, "Rejected registration option");
            return FAILURE;
        }
    };

    match settings::set_registration_mode(state.settings.as_ref(), mode).await {
        Ok(()) => {
            info!(mode = %mode, admin = %admin, "Registration option changed");
            state.templates.apply_mode(Some(mode));
            SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Failed to store registration option");
            FAILURE
        }
    }
}

async fn invitation_context(state: &AppState) -> Result<InvitationContext, StoreError> {
    Ok(InvitationContext {
        ctf_name: settings::ctf_name(state.settings.as_ref()).await?,
        registration_url: state.config.routes.registration_url(),
        mode: settings::registration_mode(state.settings.as_ref()).await?,
    })
}

/// POST /admin/invited_teams/send_invitation
pub async fn send_invitation_all(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminAuth>,
) -> &'static str {
    info!(admin = %admin, "Sending invitations to all pending teams");
    let summary = async {
        let ctx = invitation_context(&state).await?;
        send_invitation_to_all(
            state.invited.as_ref(),
            state.teams.as_ref(),
            state.mailer.as_ref(),
            &ctx,
        )
        .await
    };

    match summary.await {
        Ok(Some(summary)) => {
            metrics::record_invitations_sent(summary.sent, summary.failed);
            SUCCESS
        }
        Ok(None) => FAILURE,
        Err(e) => {
            error!(error = %e, "Failed to send invitations");
            FAILURE
        }
    }
}

/// POST /admin/invited_teams/send_invitation/:id
pub async fn send_invitation(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminAuth>,
    Path(id): Path<i64>,
) -> &'static str {
    info!(id, admin = %admin, "Sending invitation");
    let sent = async {
        let ctx = invitation_context(&state).await?;
        send_invitation_to_one(id, state.invited.as_ref(), state.mailer.as_ref(), &ctx).await
    };

    match sent.await {
        Ok(sent) => {
            if state.mailer.can_send_mail() {
                metrics::record_invitations_sent(usize::from(sent), usize::from(!sent));
            }
            status_text(sent)
        }
        Err(e) => {
            error!(id, error = %e, "Failed to send invitation");
            FAILURE
        }
    }
}
