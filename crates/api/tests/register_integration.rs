//! Integration tests for the registration page and the health endpoints.

mod common;

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    response::Response,
};
use common::{body_json, body_string, form_request, test_config, TestApp};
use domain::models::{InvitedTeam, NewTeam};
use domain::services::{RecordingMailer, SentMailKind};
use domain::stores::{InvitedTeamStore, TeamStore};

fn register_get() -> Request<Body> {
    Request::builder()
        .uri("/register")
        .body(Body::empty())
        .unwrap()
}

fn register_post(body: &str) -> Request<Body> {
    form_request(Request::builder().method("POST").uri("/register"), body)
}

fn token_form(team: &InvitedTeam, password: &str) -> String {
    format!("token={}&password={}", team.token, password)
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// ============================================================================
// Registration page
// ============================================================================

#[tokio::test]
async fn test_page_renders_token_form_by_default() {
    let app = TestApp::new().await;

    let response = app.send(register_get()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains(r#"name="token""#));
    assert!(html.contains("Register - CTFd"));
    assert_eq!(app.state.render_cache.len(), 1);
}

#[tokio::test]
async fn test_page_follows_stored_email_mode() {
    let app = TestApp::with(
        test_config(),
        RecordingMailer::unavailable(),
        &[("private_registration_option", "email")],
    )
    .await;

    let html = body_string(app.send(register_get()).await).await;

    assert!(html.contains(r#"name="email""#));
    assert!(!html.contains(r#"name="token""#));
}

#[tokio::test]
async fn test_closed_registration_redirects_to_login() {
    let app = TestApp::with(
        test_config(),
        RecordingMailer::unavailable(),
        &[("prevent_registration", "1")],
    )
    .await;

    let response = app.send(register_get()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = app.send(register_post("token=x&password=y")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(app.teams.teams().is_empty());
}

// ============================================================================
// Token mode
// ============================================================================

#[tokio::test]
async fn test_valid_token_registers_and_signs_in() {
    let app = TestApp::new().await;
    let invited = app.invite("Team A", "A@B.com").await;

    let response = app.send(register_post(&token_form(&invited, "hunter2"))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/challenges");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let token = cookie
        .trim_start_matches("session=")
        .split(';')
        .next()
        .unwrap();
    let claims = app.state.sessions.validate(token).unwrap();
    assert_eq!(claims.username, "Team A");
    assert!(!claims.admin);

    let teams = app.teams.teams();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].email, "a@b.com");
    let hash = app.teams.password_hash("Team A").unwrap();
    assert!(shared::password::verify_password("hunter2", &hash).unwrap());

    // The invitation stays in place.
    assert_eq!(app.invited.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_token_rerenders_with_values() {
    let app = TestApp::new().await;
    app.invite("Team A", "a@b.com").await;

    let response = app
        .send(register_post("token=not-a-real-token&password=hunter2"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Invalid token"));
    assert!(html.contains(r#"value="not-a-real-token""#));
    assert!(html.contains(r#"value="hunter2""#));
    assert!(app.teams.teams().is_empty());
}

#[tokio::test]
async fn test_rejected_submission_is_not_cached() {
    let app = TestApp::new().await;

    app.send(register_post("token=bad&password=hunter2")).await;
    assert!(app.state.render_cache.is_empty());

    let html = body_string(app.send(register_get()).await).await;
    assert!(!html.contains("Invalid token"));
}

#[tokio::test]
async fn test_second_registration_is_rejected() {
    let app = TestApp::new().await;
    let invited = app.invite("Team A", "a@b.com").await;

    let first = app.send(register_post(&token_form(&invited, "hunter2"))).await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = app.send(register_post(&token_form(&invited, "hunter2"))).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert!(body_string(second).await.contains("Already registered"));
    assert_eq!(app.teams.teams().len(), 1);
}

#[tokio::test]
async fn test_password_bounds() {
    let app = TestApp::new().await;
    let invited = app.invite("Team A", "a@b.com").await;

    let response = app.send(register_post(&token_form(&invited, ""))).await;
    let html = body_string(response).await;
    assert!(html.contains("Pick a longer password"));
    assert!(html.contains(&format!(r#"value="{}""#, invited.token)));

    let long = "a".repeat(129);
    let response = app.send(register_post(&token_form(&invited, &long))).await;
    assert!(body_string(response).await.contains("Pick a shorter password"));

    let max = "a".repeat(128);
    let response = app.send(register_post(&token_form(&invited, &max))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_errors_accumulate() {
    let app = TestApp::new().await;

    let response = app.send(register_post("token=bad&password=")).await;

    let html = body_string(response).await;
    assert!(html.contains("Invalid token"));
    assert!(html.contains("Pick a longer password"));
}

// ============================================================================
// Email mode
// ============================================================================

#[tokio::test]
async fn test_email_mode_registration() {
    let app = TestApp::new().await;
    let invited = app.invite("Team A", "a@b.com").await;

    let response = app
        .send(form_request(
            common::admin_request("POST", "/admin/invited_teams/option"),
            "selected_option=email",
        ))
        .await;
    assert_eq!(body_string(response).await, "1");

    // The token is no longer accepted.
    let response = app.send(register_post(&token_form(&invited, "hunter2"))).await;
    let html = body_string(response).await;
    assert!(html.contains("Your email is not invited"));
    assert!(!html.contains(&invited.token));

    let response = app
        .send(register_post("email=a%40b.com&password=hunter2"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/challenges");
    assert_eq!(app.teams.teams()[0].name, "Team A");
}

#[tokio::test]
async fn test_unknown_stored_mode() {
    let app = TestApp::new().await;
    app.invite("Team A", "a@b.com").await;
    app.set_mode("password").await;

    // The page keeps the last registered template.
    let html = body_string(app.send(register_get()).await).await;
    assert!(html.contains(r#"name="token""#));

    let response = app.send(register_post("token=x&password=hunter2")).await;
    let html = body_string(response).await;
    assert!(html.contains("Something strange happened"));
    assert!(!html.contains(r#"value="hunter2""#));
}

// ============================================================================
// Mail follow-up
// ============================================================================

#[tokio::test]
async fn test_verification_redirects_to_confirm() {
    let app = TestApp::with(
        test_config(),
        RecordingMailer::new(),
        &[("verify_emails", "1")],
    )
    .await;
    let invited = app.invite("Team A", "a@b.com").await;

    let response = app.send(register_post(&token_form(&invited, "hunter2"))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/confirm");
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, SentMailKind::Verification);
    assert_eq!(sent[0].to, "a@b.com");
}

#[tokio::test]
async fn test_confirmation_mail_without_verification() {
    let app = TestApp::with(
        test_config(),
        RecordingMailer::new(),
        &[("ctf_name", "Finals")],
    )
    .await;
    let invited = app.invite("Team A", "a@b.com").await;

    let response = app.send(register_post(&token_form(&invited, "hunter2"))).await;

    assert_eq!(location(&response), "/challenges");
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, SentMailKind::Text);
    assert_eq!(sent[0].text, "You've successfully registered for Finals");
}

#[tokio::test]
async fn test_verify_emails_ignored_without_mailer() {
    let app = TestApp::with(
        test_config(),
        RecordingMailer::unavailable(),
        &[("verify_emails", "1")],
    )
    .await;
    let invited = app.invite("Team A", "a@b.com").await;

    let response = app.send(register_post(&token_form(&invited, "hunter2"))).await;

    assert_eq!(location(&response), "/challenges");
}

#[tokio::test]
async fn test_invited_team_name_taken_by_other_account() {
    let app = TestApp::new().await;
    let invited = app.invite("Team A", "a@b.com").await;
    app.teams
        .create(NewTeam {
            name: "Team A".to_string(),
            email: "other@b.com".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .unwrap();

    let response = app.send(register_post(&token_form(&invited, "hunter2"))).await;

    assert!(body_string(response).await.contains("Already registered"));
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_submissions_are_rate_limited() {
    let mut config = test_config();
    config.security.registration_rate_limit_per_minute = 1;
    let app = TestApp::with(config, RecordingMailer::unavailable(), &[]).await;

    let first = app.send(register_post("token=bad&password=x")).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.send(register_post("token=bad&password=x")).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));

    // Page views are never limited.
    let page = app.send(register_get()).await;
    assert_eq!(page.status(), StatusCode::OK);
}

fn register_post_from(peer: &str, forwarded_for: &str) -> Request<Body> {
    let mut request = form_request(
        Request::builder()
            .method("POST")
            .uri("/register")
            .header("x-forwarded-for", forwarded_for),
        "token=bad&password=x",
    );
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_bypass_limit() {
    let mut config = test_config();
    config.security.registration_rate_limit_per_minute = 1;
    let app = TestApp::with(config, RecordingMailer::unavailable(), &[]).await;

    let mut statuses = Vec::new();
    for i in 0..5 {
        let response = app
            .send(register_post_from("198.51.100.9:5000", &format!("10.0.0.{}", i)))
            .await;
        statuses.push(response.status());
    }

    assert_eq!(statuses[0], StatusCode::OK);
    assert!(statuses[1..]
        .iter()
        .all(|status| *status == StatusCode::TOO_MANY_REQUESTS));
    let limiter = app.state.rate_limiter.as_ref().unwrap();
    assert_eq!(limiter.tracked_clients(), 1);

    // A different peer has its own quota.
    let other = app
        .send(register_post_from("198.51.100.10:5000", "10.0.0.1"))
        .await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_trusted_proxy_limits_forwarded_client() {
    let mut config = test_config();
    config.security.registration_rate_limit_per_minute = 1;
    config.security.trust_forwarded_for = true;
    let app = TestApp::with(config, RecordingMailer::unavailable(), &[]).await;

    let first = app
        .send(register_post_from("10.0.0.254:5000", "203.0.113.7"))
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .send(register_post_from("10.0.0.254:5000", "203.0.113.7"))
        .await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_client = app
        .send(register_post_from("10.0.0.254:5000", "203.0.113.8"))
        .await;
    assert_eq!(other_client.status(), StatusCode::OK);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_without_database() {
    let app = TestApp::with_mailer(RecordingMailer::new()).await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"]["connected"], serde_json::Value::Null);
    assert_eq!(json["mail_enabled"], true);
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new().await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "alive");
}
