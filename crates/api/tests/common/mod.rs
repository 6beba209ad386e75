//! Common test utilities for integration tests.
//!
//! The router is driven over in-memory stores and a recording mailer, so the
//! tests need no database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use domain::models::{InvitedTeam, NewInvitedTeam, REGISTRATION_OPTION_KEY};
use domain::services::RecordingMailer;
use domain::stores::{InvitedTeamStore, MemoryConfigStore, MemoryInvitedTeamStore, MemoryTeamStore};
use private_registration_api::{
    app::{create_app, initialize, AppState},
    config::{
        Config, DatabaseConfig, EmailConfig, LoggingConfig, RoutesConfig, SecurityConfig,
        ServerConfig, SessionConfig,
    },
};
use tower::ServiceExt;

pub const ADMIN_API_KEY: &str = "test-admin-key";
pub const MULTIPART_BOUNDARY: &str = "X-TEST-BOUNDARY";

/// Test configuration with the admin key set and rate limiting disabled.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: 1048576,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            admin_api_key_hash: shared::crypto::sha256_hex(ADMIN_API_KEY),
            registration_rate_limit_per_minute: 0, // Disable rate limiting for tests
            trust_forwarded_for: false,
        },
        session: SessionConfig {
            secret: "test-session-secret".to_string(),
            cookie_name: "session".to_string(),
            lifetime_secs: 3600,
            secure_cookie: false,
        },
        email: EmailConfig {
            enabled: false,
            provider: "console".to_string(),
            sendgrid_api_key: String::new(),
            sender_email: "test@example.com".to_string(),
            sender_name: "Test".to_string(),
        },
        routes: RoutesConfig {
            public_base_url: "https://ctf.example".to_string(),
            ..RoutesConfig::default()
        },
    }
}

/// Application under test with direct handles on its stores.
pub struct TestApp {
    pub state: AppState,
    pub invited: Arc<MemoryInvitedTeamStore>,
    pub teams: Arc<MemoryTeamStore>,
    pub settings: Arc<MemoryConfigStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with(test_config(), RecordingMailer::unavailable(), &[]).await
    }

    pub async fn with_mailer(mailer: RecordingMailer) -> Self {
        Self::with(test_config(), mailer, &[]).await
    }

    /// Builds and initializes an app with pre-set config store values.
    pub async fn with(config: Config, mailer: RecordingMailer, values: &[(&str, &str)]) -> Self {
        let invited = Arc::new(MemoryInvitedTeamStore::new());
        let teams = Arc::new(MemoryTeamStore::new());
        let settings = Arc::new(MemoryConfigStore::with_values(values.iter().copied()));
        let mailer = Arc::new(mailer);

        let state = AppState::new(
            config,
            invited.clone(),
            teams.clone(),
            settings.clone(),
            mailer.clone(),
        );
        initialize(&state).await.expect("Failed to initialize app");

        Self {
            state,
            invited,
            teams,
            settings,
            mailer,
        }
    }

    pub fn router(&self) -> Router {
        create_app(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn invite(&self, name: &str, email: &str) -> InvitedTeam {
        self.invited
            .create(NewInvitedTeam::with_generated_token(name, email))
            .await
            .expect("Failed to create invited team")
    }

    pub async fn set_mode(&self, mode: &str) {
        use domain::stores::ConfigStore;
        self.settings
            .set(REGISTRATION_OPTION_KEY, mode)
            .await
            .expect("Failed to set mode");
    }
}

/// Read the response body as a string.
pub async fn body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Read the response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Admin request authenticated with the API key.
pub fn admin_request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", ADMIN_API_KEY)
}

/// Admin POST with an empty body.
pub fn admin_post(uri: &str) -> Request<Body> {
    admin_request("POST", uri).body(Body::empty()).unwrap()
}

/// URL-encoded form request.
pub fn form_request(builder: axum::http::request::Builder, body: &str) -> Request<Body> {
    builder
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart body with one file field.
pub fn multipart_body(field: &str, file_name: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n{content}\r\n--{b}--\r\n",
        b = MULTIPART_BOUNDARY,
    )
}

/// Admin CSV upload.
pub fn import_request(field: &str, content: &str) -> Request<Body> {
    admin_request("POST", "/admin/invited_teams/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .body(Body::from(multipart_body(field, "teams.csv", content)))
        .unwrap()
}
