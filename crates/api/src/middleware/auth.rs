//! Admin gate.
//!
//! Admin routes accept either an `X-API-Key` header whose SHA-256 digest
//! matches the configured hash, or a session cookie issued to an admin team.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// How an admin request was authenticated. Stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAuth {
    ApiKey,
    Session { team_id: i64, username: String },
}

impl std::fmt::Display for AdminAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminAuth::ApiKey => f.write_str("api-key"),
            AdminAuth::Session { team_id, username } => {
                write!(f, "session:{}({})", username, team_id)
            }
        }
    }
}

enum Credential {
    Missing,
    Rejected(&'static str),
    NotAdmin,
    Admin(AdminAuth),
}

fn api_key_credential(state: &AppState, headers: &HeaderMap) -> Option<Credential> {
    let key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())?;
    let expected = &state.config.security.admin_api_key_hash;
    if !expected.is_empty() && shared::crypto::sha256_hex(key) == *expected {
        Some(Credential::Admin(AdminAuth::ApiKey))
    } else {
        Some(Credential::Rejected("Invalid API key"))
    }
}

fn session_credential(state: &AppState, headers: &HeaderMap) -> Option<Credential> {
    let token = state.cookies.extract_session(headers)?;
    let credential = match state.sessions.validate(token) {
        Ok(claims) if claims.admin => Credential::Admin(AdminAuth::Session {
            team_id: claims.sub,
            username: claims.username,
        }),
        Ok(_) => Credential::NotAdmin,
        Err(e) => {
            tracing::debug!(error = %e, "Session cookie rejected");
            Credential::Rejected("Invalid or expired session")
        }
    };
    Some(credential)
}

/// Middleware for admin-only routes.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let credential = api_key_credential(&state, req.headers())
        .or_else(|| session_credential(&state, req.headers()))
        .unwrap_or(Credential::Missing);

    match credential {
        Credential::Admin(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Credential::NotAdmin => forbidden_response("Admin access required"),
        Credential::Rejected(message) => unauthorized_response(message),
        Credential::Missing => unauthorized_response("Authentication required"),
    }
}

/// Helper to create unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

/// Helper to create forbidden response.
fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "forbidden",
            "message": message
        })),
    )
        .into_response()
}
