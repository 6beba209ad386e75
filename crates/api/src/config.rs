use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Signed session cookie configuration
    pub session: SessionConfig,
    /// Email service configuration
    #[serde(default)]
    pub email: EmailConfig,
    /// Platform pages the registration flow redirects to
    #[serde(default)]
    pub routes: RoutesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound for request bodies, including CSV uploads
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// SHA-256 hex digest of the admin API key. Empty disables key access.
    #[serde(default)]
    pub admin_api_key_hash: String,

    /// Registration attempts allowed per client IP and minute. 0 disables.
    #[serde(default = "default_registration_rate_limit")]
    pub registration_rate_limit_per_minute: u32,

    /// Take the client IP from `X-Forwarded-For`. Only enable behind a
    /// reverse proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret for session tokens and email verification links
    pub secret: String,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_session_lifetime")]
    pub lifetime_secs: i64,

    /// Adds the Secure attribute to the session cookie
    #[serde(default)]
    pub secure_cookie: bool,
}

/// Email service configuration for invitation and registration mails.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: sendgrid, or console (for development)
    #[serde(default = "default_email_provider")]
    pub provider: String,

    /// SendGrid API key (for sendgrid provider)
    #[serde(default)]
    pub sendgrid_api_key: String,

    /// Sender email address (From header)
    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    /// Sender name (From header)
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    /// External base URL, used in links sent by mail
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_register_path")]
    pub register_path: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_challenges_path")]
    pub challenges_path: String,

    #[serde(default = "default_confirm_path")]
    pub confirm_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            register_path: default_register_path(),
            login_path: default_login_path(),
            challenges_path: default_challenges_path(),
            confirm_path: default_confirm_path(),
        }
    }
}

impl RoutesConfig {
    /// Absolute URL of the registration page.
    pub fn registration_url(&self) -> String {
        format!(
            "{}{}",
            self.public_base_url.trim_end_matches('/'),
            self.register_path
        )
    }

    /// Absolute URL of the email confirmation page for a signed token.
    pub fn confirmation_url(&self, token: &str) -> String {
        format!(
            "{}{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.confirm_path,
            token
        )
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_registration_rate_limit() -> u32 {
    30
}
fn default_cookie_name() -> String {
    "session".to_string()
}
fn default_session_lifetime() -> i64 {
    604800 // 7 days
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sender_email() -> String {
    "noreply@ctf.local".to_string()
}
fn default_sender_name() -> String {
    "CTFd".to_string()
}
fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_register_path() -> String {
    "/register".to_string()
}
fn default_login_path() -> String {
    "/login".to_string()
}
fn default_challenges_path() -> String {
    "/challenges".to_string()
}
fn default_confirm_path() -> String {
    "/confirm".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PR__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PR").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the working directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 1048576

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            admin_api_key_hash = ""
            registration_rate_limit_per_minute = 30
            trust_forwarded_for = false

            [session]
            secret = "test-session-secret"
            cookie_name = "session"
            lifetime_secs = 604800

            [email]
            enabled = false
            provider = "console"
            sender_email = "test@example.com"
            sender_name = "Test"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PR__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.session.secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PR__SESSION__SECRET environment variable must be set".to_string(),
            ));
        }

        if self.session.lifetime_secs <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "session.lifetime_secs must be positive".to_string(),
            ));
        }

        match self.email.provider.as_str() {
            "console" => {}
            "sendgrid" => {
                if self.email.enabled && self.email.sendgrid_api_key.is_empty() {
                    return Err(ConfigValidationError::MissingRequired(
                        "email.sendgrid_api_key is required for the sendgrid provider"
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown email provider: {}",
                    other
                )));
            }
        }

        if !self.security.admin_api_key_hash.is_empty()
            && !(self.security.admin_api_key_hash.len() == 64
                && self
                    .security
                    .admin_api_key_hash
                    .chars()
                    .all(|c| c.is_ascii_hexdigit()))
        {
            return Err(ConfigValidationError::InvalidValue(
                "security.admin_api_key_hash must be a SHA-256 hex digest".to_string(),
            ));
        }

        let routes = &self.routes;
        for path in [
            &routes.register_path,
            &routes.login_path,
            &routes.challenges_path,
            &routes.confirm_path,
        ] {
            if !path.starts_with('/') {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Route path must start with '/': {}",
                    path
                )));
            }
        }

        if self.socket_addr().is_none() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Invalid listen address {}:{}",
                self.server.host, self.server.port
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .ok()
    }
}
