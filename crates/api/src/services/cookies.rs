//! Session cookie helper.
//!
//! Sets, reads, and clears the httpOnly cookie carrying the signed session
//! token issued after a successful registration.

use axum::http::{header::COOKIE, HeaderMap};

use crate::config::SessionConfig;

const SAME_SITE: &str = "Lax";

/// Cookie helper for the session cookie.
#[derive(Debug, Clone)]
pub struct CookieHelper {
    name: String,
    secure: bool,
    max_age: i64,
}

impl CookieHelper {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.secure_cookie,
            max_age: config.lifetime_secs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a Set-Cookie header value for a session token.
    pub fn build_session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            self.name, token, self.max_age
        );
        self.push_attributes(&mut cookie);
        cookie
    }

    fn push_attributes(&self, cookie: &mut String) {
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(SAME_SITE);
    }

    /// Extract the session token from request headers.
    pub fn extract_session<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        extract_cookie(headers, &self.name)
    }
}

/// Extract a cookie value from request headers by name.
pub fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|header| header.split(';'))
        .map(str::trim)
        .find_map(|cookie| {
            let (cookie_name, cookie_value) = cookie.split_once('=')?;
            (cookie_name == name).then_some(cookie_value)
        })
}
