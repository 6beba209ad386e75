//! Email service backing the registration and invitation mails.
//!
//! Supports two providers:
//! - `console`: Logs emails (development)
//! - `sendgrid`: Uses SendGrid API

use std::sync::Arc;

use async_trait::async_trait;
use domain::services::Mailer;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{Config, EmailConfig, RoutesConfig};

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Email service disabled")]
    Disabled,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
}

/// Email service for sending plain-text mails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    routes: Arc<RoutesConfig>,
    /// Signs email confirmation links.
    secret: Arc<str>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig, routes: RoutesConfig, secret: &str) -> Self {
        Self {
            config: Arc::new(config),
            routes: Arc::new(routes),
            secret: Arc::from(secret),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.email.clone(),
            config.routes.clone(),
            &config.session.secret,
        )
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn subject(&self) -> String {
        format!("Message from {}", self.config.sender_name)
    }

    /// Send an email message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Err(EmailError::Disabled);
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Builds the confirmation link mail for `to`.
    pub fn verification_message(&self, to: &str) -> EmailMessage {
        let token = shared::crypto::email_confirmation_token(&self.secret, to);
        let url = self.routes.confirmation_url(&token);
        EmailMessage {
            to: to.to_string(),
            subject: self.subject(),
            body_text: format!(
                "Please click the following link to confirm your email address: {}",
                url
            ),
        }
    }

    fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            body_text = %message.body_text,
            "Email (console provider)"
        );
        Ok(())
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = serde_json::json!({
            "personalizations": [{
                "to": [{ "email": message.to }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body_text
            }]
        });

        let response = self
            .client
            .post(SENDGRID_ENDPOINT)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.sendgrid_api_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }

    async fn deliver(&self, message: EmailMessage) -> bool {
        let to = message.to.clone();
        match self.send(message).await {
            Ok(()) => {
                metrics::counter!("emails_sent_total", "result" => "success").increment(1);
                true
            }
            Err(e) => {
                metrics::counter!("emails_sent_total", "result" => "failure").increment(1);
                error!(to = %to, error = %e, "Failed to send email");
                false
            }
        }
    }
}

#[async_trait]
impl Mailer for EmailService {
    fn can_send_mail(&self) -> bool {
        self.is_enabled()
    }

    async fn send_mail(&self, to: &str, text: &str) -> bool {
        self.deliver(EmailMessage {
            to: to.to_string(),
            subject: self.subject(),
            body_text: text.to_string(),
        })
        .await
    }

    async fn send_verification(&self, to: &str) -> bool {
        self.deliver(self.verification_message(to)).await
    }
}
