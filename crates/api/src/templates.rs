//! Registration page templates.
//!
//! Two bundled forms exist, one per registration mode. The active one is
//! registered as the override for `register.html` at startup and whenever the
//! admin switches modes. Blank forms are cached per template; the cache is
//! cleared on every mode change.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use domain::models::{FormValues, RegistrationMode};

/// Name of the overridden platform template.
pub const REGISTER_TEMPLATE: &str = "register.html";

/// Bundled registration forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegisterTemplate {
    #[default]
    TokenForm,
    EmailForm,
}

/// Values rendered into a registration form.
#[derive(Debug, Clone, Copy)]
pub struct RegisterPage<'a> {
    pub ctf_name: &'a str,
    pub action: &'a str,
    pub errors: &'a [String],
    pub values: &'a FormValues,
}

impl RegisterTemplate {
    pub fn for_mode(mode: RegistrationMode) -> Self {
        match mode {
            RegistrationMode::Token => Self::TokenForm,
            RegistrationMode::Email => Self::EmailForm,
        }
    }

    /// File name the template is bundled under.
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::TokenForm => "private-registration-token.html",
            Self::EmailForm => "private-registration-email.html",
        }
    }

    pub fn render(&self, page: &RegisterPage<'_>) -> String {
        let errors_html: String = page
            .errors
            .iter()
            .map(|error| {
                format!(
                    r#"
      <div class="alert alert-danger" role="alert">{}</div>"#,
                    html_escape(error)
                )
            })
            .collect();

        let identity_field = match self {
            Self::TokenForm => format!(
                r#"<label for="token-input">Invitation token</label>
        <input class="form-control" type="text" name="token" id="token-input" value="{}" autocomplete="off" required>"#,
                html_escape(page.values.token.as_deref().unwrap_or_default())
            ),
            Self::EmailForm => format!(
                r#"<label for="email-input">Invited email</label>
        <input class="form-control" type="email" name="email" id="email-input" value="{}" required>"#,
                html_escape(page.values.email.as_deref().unwrap_or_default())
            ),
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Register - {ctf_name}</title>
</head>
<body>
  <div class="jumbotron">
    <h1>Register</h1>
  </div>
  <div class="container">{errors_html}
    <form method="post" action="{action}" accept-charset="utf-8">
      <div class="form-group">
        {identity_field}
      </div>
      <div class="form-group">
        <label for="password-input">Password</label>
        <input class="form-control" type="password" name="password" id="password-input" value="{password}">
      </div>
      <button type="submit" class="btn btn-primary">Submit</button>
    </form>
  </div>
</body>
</html>
"#,
            ctf_name = html_escape(page.ctf_name),
            errors_html = errors_html,
            action = html_escape(page.action),
            identity_field = identity_field,
            password = html_escape(page.values.password.as_deref().unwrap_or_default()),
        )
    }
}

/// Simple HTML escaping.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Named template overrides.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    overrides: RwLock<HashMap<String, RegisterTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn override_template(&self, name: &str, template: RegisterTemplate) {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), template);
    }

    pub fn get(&self, name: &str) -> Option<RegisterTemplate> {
        self.overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    /// Registers the form matching `mode`. An unknown mode keeps the
    /// current override.
    pub fn apply_mode(&self, mode: Option<RegistrationMode>) {
        if let Some(mode) = mode {
            let template = RegisterTemplate::for_mode(mode);
            tracing::debug!(template = template.source_name(), "Register template override set");
            self.override_template(REGISTER_TEMPLATE, template);
        }
    }

    /// Template currently serving the registration page.
    pub fn register_template(&self) -> RegisterTemplate {
        self.get(REGISTER_TEMPLATE).unwrap_or_default()
    }
}

/// Cached blank registration pages, keyed by template and competition name.
#[derive(Debug, Default)]
pub struct RenderCache {
    pages: RwLock<HashMap<(RegisterTemplate, String), String>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, template: RegisterTemplate, ctf_name: &str) -> Option<String> {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(template, ctf_name.to_string()))
            .cloned()
    }

    pub fn insert(&self, template: RegisterTemplate, ctf_name: &str, html: String) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((template, ctf_name.to_string()), html);
    }

    pub fn clear(&self) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.pages.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
