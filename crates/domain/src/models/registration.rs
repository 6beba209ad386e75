//! Private registration models.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Config key holding the registration matching mode.
pub const REGISTRATION_OPTION_KEY: &str = "private_registration_option";

/// How a registering team proves it was invited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMode {
    /// The team submits the secret token it received.
    #[default]
    Token,
    /// The team submits the email address it was invited with.
    Email,
}

impl RegistrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Email => "email",
        }
    }
}

impl std::fmt::Display for RegistrationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown registration mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown registration option: {0}")]
pub struct UnknownRegistrationMode(pub String);

impl FromStr for RegistrationMode {
    type Err = UnknownRegistrationMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token" => Ok(Self::Token),
            "email" => Ok(Self::Email),
            other => Err(UnknownRegistrationMode(other.to_string())),
        }
    }
}

/// Submitted registration form. Which of `token`/`email` is read depends on
/// the active mode.
#[derive(Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Values echoed back into the form when a submission is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}
