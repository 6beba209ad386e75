//! Common validation utilities for team names, emails and passwords.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum length of a team name, in characters.
pub const MAX_TEAM_NAME_LENGTH: usize = 128;

/// Maximum length of a team email, in characters.
pub const MAX_EMAIL_LENGTH: usize = 128;

/// Maximum length of a registration password, in characters.
pub const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    /// Accepted shape of an invitee email: `local@domain.tld`.
    pub static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").unwrap();
}

/// Validates a team name: non-empty and at most 128 characters.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        let mut err = ValidationError::new("team_name_empty");
        err.message = Some("Team name must not be empty".into());
        return Err(err);
    }
    if name.chars().count() > MAX_TEAM_NAME_LENGTH {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some("Team name must be at most 128 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a team email against [`EMAIL_REGEX`] and the column length.
pub fn validate_team_email(email: &str) -> Result<(), ValidationError> {
    if email.chars().count() > MAX_EMAIL_LENGTH || !EMAIL_REGEX.is_match(email) {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Email must look like local@domain.tld".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a registration password length (1..=128 characters).
///
/// The error code is `password_too_short` or `password_too_long`.
pub fn validate_password_length(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if length == 0 {
        let mut err = ValidationError::new("password_too_short");
        err.message = Some("Password must not be empty".into());
        return Err(err);
    }
    if length > MAX_PASSWORD_LENGTH {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some("Password must be at most 128 characters".into());
        return Err(err);
    }
    Ok(())
}
