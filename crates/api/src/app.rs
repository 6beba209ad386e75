use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{settings, Mailer};
use domain::stores::{ConfigStore, InvitedTeamStore, StoreError, TeamStore};
use shared::session::SessionSigner;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{health, invited_teams, register};
use crate::services::cookies::CookieHelper;
use crate::templates::{RenderCache, TemplateRegistry};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub invited: Arc<dyn InvitedTeamStore>,
    pub teams: Arc<dyn TeamStore>,
    pub settings: Arc<dyn ConfigStore>,
    pub mailer: Arc<dyn Mailer>,
    pub templates: Arc<TemplateRegistry>,
    pub render_cache: Arc<RenderCache>,
    pub sessions: SessionSigner,
    pub cookies: CookieHelper,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    /// Present when the stores are database-backed; used by health checks.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: Config,
        invited: Arc<dyn InvitedTeamStore>,
        teams: Arc<dyn TeamStore>,
        settings: Arc<dyn ConfigStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let sessions = SessionSigner::new(&config.session.secret, config.session.lifetime_secs);
        let cookies = CookieHelper::new(&config.session);
        let rate_limiter = RateLimiterState::new(
            config.security.registration_rate_limit_per_minute,
            config.security.trust_forwarded_for,
        )
        .map(Arc::new);

        Self {
            config: Arc::new(config),
            invited,
            teams,
            settings,
            mailer,
            templates: Arc::new(TemplateRegistry::new()),
            render_cache: Arc::new(RenderCache::new()),
            sessions,
            cookies,
            rate_limiter,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Stores the default registration mode if none is set and registers the
/// matching template. Runs once before serving.
pub async fn initialize(state: &AppState) -> Result<(), StoreError> {
    let mode = settings::ensure_registration_mode(state.settings.as_ref()).await?;
    state.templates.apply_mode(mode);
    state.render_cache.clear();
    tracing::info!(
        mode = ?mode,
        template = state.templates.register_template().source_name(),
        "Private registration initialized"
    );
    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Admin routes (API key or admin session)
    let admin_routes = Router::new()
        .route(
            "/admin/invited_teams/",
            get(invited_teams::list_invited_teams),
        )
        .route(
            "/admin/invited_teams/delete/all",
            post(invited_teams::delete_all_invited_teams),
        )
        .route(
            "/admin/invited_teams/delete/:id",
            post(invited_teams::delete_invited_team),
        )
        .route(
            "/admin/invited_teams/export",
            get(invited_teams::export_invited_teams),
        )
        .route(
            "/admin/invited_teams/import",
            post(invited_teams::import_invited_teams),
        )
        .route("/admin/invited_teams/option", post(invited_teams::set_option))
        .route(
            "/admin/invited_teams/send_invitation",
            post(invited_teams::send_invitation_all),
        )
        .route(
            "/admin/invited_teams/send_invitation/:id",
            post(invited_teams::send_invitation),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Registration page, rate limited per client on submit
    let register_routes = Router::new()
        .route(
            &config.routes.register_path,
            get(register::register_page).post(register::register_submit),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(register_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
