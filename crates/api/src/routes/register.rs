//! Invitation-only registration page.

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use domain::models::{FormValues, RegistrationForm};
use domain::services::{settings, NextStep, RegistrationEvent, RegistrationGate, RegistrationResult};
use shared::crypto::generate_session_nonce;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics;
use crate::templates::RegisterPage;

/// Redirect to login when the host has closed registration.
async fn closed_redirect(state: &AppState) -> Result<Option<Response>, ApiError> {
    if settings::registration_open(state.settings.as_ref()).await? {
        return Ok(None);
    }
    tracing::debug!("Registration closed, redirecting to login");
    Ok(Some(
        Redirect::to(&state.config.routes.login_path).into_response(),
    ))
}

fn render(state: &AppState, ctf_name: &str, errors: &[String], values: &FormValues) -> String {
    state.templates.register_template().render(&RegisterPage {
        ctf_name,
        action: &state.config.routes.register_path,
        errors,
        values,
    })
}

/// GET /register
pub async fn register_page(State(state): State<AppState>) -> Result<Response, ApiError> {
    if let Some(redirect) = closed_redirect(&state).await? {
        return Ok(redirect);
    }

    let template = state.templates.register_template();
    let ctf_name = settings::ctf_name(state.settings.as_ref()).await?;

    let page = match state.render_cache.get(template, &ctf_name) {
        Some(page) => page,
        None => {
            let page = render(&state, &ctf_name, &[], &FormValues::default());
            state.render_cache.insert(template, &ctf_name, page.clone());
            page
        }
    };

    Ok(Html(page).into_response())
}

fn event_label(event: RegistrationEvent) -> &'static str {
    match event {
        RegistrationEvent::Registered => "registered",
        RegistrationEvent::RegisteredUnconfirmed => "registered_unconfirmed",
    }
}

/// POST /register
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, ApiError> {
    if let Some(redirect) = closed_redirect(&state).await? {
        return Ok(redirect);
    }

    let gate = RegistrationGate {
        invited: state.invited.as_ref(),
        teams: state.teams.as_ref(),
        config: state.settings.as_ref(),
        mailer: state.mailer.as_ref(),
    };

    match gate.submit(&form).await? {
        RegistrationResult::Rejected { errors, values, .. } => {
            metrics::record_registration_rejected();
            let ctf_name = settings::ctf_name(state.settings.as_ref()).await?;
            Ok(Html(render(&state, &ctf_name, &errors, &values)).into_response())
        }
        RegistrationResult::Registered { team, next, audit } => {
            metrics::record_registration(event_label(audit.event));

            let token = state
                .sessions
                .issue(team.id, &team.name, team.admin, &generate_session_nonce())
                .map_err(|e| ApiError::Internal(format!("Failed to issue session: {}", e)))?;
            let cookie = state.cookies.build_session_cookie(&token);

            let routes = &state.config.routes;
            let target = match next {
                NextStep::ConfirmEmail => &routes.confirm_path,
                NextStep::Challenges => &routes.challenges_path,
            };
            tracing::info!(team_id = team.id, team_name = %team.name, "Team registered");

            Ok(([(header::SET_COOKIE, cookie)], Redirect::to(target)).into_response())
        }
    }
}
