//! Host policy values read from the config store.

use tracing::{info, warn};

use crate::models::{RegistrationMode, REGISTRATION_OPTION_KEY};
use crate::stores::{ConfigStore, StoreError};

/// Config key holding the competition name.
pub const CTF_NAME_KEY: &str = "ctf_name";

/// Config key that closes registration when truthy.
pub const PREVENT_REGISTRATION_KEY: &str = "prevent_registration";

/// Config key that requires email verification when truthy.
pub const VERIFY_EMAILS_KEY: &str = "verify_emails";

/// Competition name used when `ctf_name` is unset.
pub const DEFAULT_CTF_NAME: &str = "CTFd";

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

async fn flag(config: &dyn ConfigStore, key: &str) -> Result<bool, StoreError> {
    Ok(config.get(key).await?.as_deref().is_some_and(is_truthy))
}

/// Reads the active registration mode.
///
/// `None` means the stored value is missing or not a known mode.
pub async fn registration_mode(
    config: &dyn ConfigStore,
) -> Result<Option<RegistrationMode>, StoreError> {
    let Some(raw) = config.get(REGISTRATION_OPTION_KEY).await? else {
        return Ok(None);
    };
    match raw.parse() {
        Ok(mode) => Ok(Some(mode)),
        Err(e) => {
            warn!(error = %e, "Stored registration option is not recognized");
            Ok(None)
        }
    }
}

/// Stores the registration mode.
pub async fn set_registration_mode(
    config: &dyn ConfigStore,
    mode: RegistrationMode,
) -> Result<(), StoreError> {
    config.set(REGISTRATION_OPTION_KEY, mode.as_str()).await?;
    info!(mode = %mode, "Registration option changed");
    Ok(())
}

/// Writes the default mode when none is stored, returning the active mode.
pub async fn ensure_registration_mode(
    config: &dyn ConfigStore,
) -> Result<Option<RegistrationMode>, StoreError> {
    if config.get(REGISTRATION_OPTION_KEY).await?.is_none() {
        set_registration_mode(config, RegistrationMode::default()).await?;
    }
    registration_mode(config).await
}

/// Competition name, falling back to [`DEFAULT_CTF_NAME`].
pub async fn ctf_name(config: &dyn ConfigStore) -> Result<String, StoreError> {
    Ok(config
        .get(CTF_NAME_KEY)
        .await?
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_CTF_NAME.to_string()))
}

/// Whether the host currently accepts registrations.
pub async fn registration_open(config: &dyn ConfigStore) -> Result<bool, StoreError> {
    Ok(!flag(config, PREVENT_REGISTRATION_KEY).await?)
}

/// Whether new teams must confirm their email.
pub async fn verify_emails(config: &dyn ConfigStore) -> Result<bool, StoreError> {
    flag(config, VERIFY_EMAILS_KEY).await
}
