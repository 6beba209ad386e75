//! Cryptographic utilities for invitation tokens, session nonces and
//! admin key hashing.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

type HmacSha256 = Hmac<Sha256>;

/// Length in hex characters of an invitation token.
pub const INVITATION_TOKEN_LEN: usize = 32;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a 32-character lowercase hex invitation token.
///
/// 16 bytes are drawn from the OS-seeded thread RNG, so every token carries
/// 128 bits of entropy.
pub fn generate_invitation_token() -> String {
    let mut bytes = [0u8; INVITATION_TOKEN_LEN / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generates a fresh session nonce (SHA-512 over random bytes, hex encoded).
pub fn generate_session_nonce() -> String {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    hex::encode(Sha512::digest(seed))
}

/// Returns true if `token` has the shape of an invitation token.
pub fn is_invitation_token(token: &str) -> bool {
    token.len() == INVITATION_TOKEN_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Signs an email address for the verification link.
///
/// The address is lowercased before signing so the link survives case changes
/// made by mail clients.
pub fn sign_email(secret: &str, email: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    };
    mac.update(email.to_lowercase().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Builds the token of an email confirmation link: the hex encoded
/// lowercased address, a dot, and its [`sign_email`] signature.
pub fn email_confirmation_token(secret: &str, email: &str) -> String {
    format!(
        "{}.{}",
        hex::encode(email.to_lowercase()),
        sign_email(secret, email)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Constant-time check of a [`sign_email`] signature, as the confirm page does.
    fn verify_email_signature(secret: &str, email: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(email.to_lowercase().as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    /// Address carried by a valid confirmation token.
    fn verify_email_confirmation_token(secret: &str, token: &str) -> Option<String> {
        let (encoded, signature) = token.split_once('.')?;
        let email = String::from_utf8(hex::decode(encoded).ok()?).ok()?;
        verify_email_signature(secret, &email, signature).then_some(email)
    }

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_invitation_token_shape() {
        let token = generate_invitation_token();
        assert_eq!(token.len(), 32);
        assert!(is_invitation_token(&token));
        assert_eq!(token, token.to_lowercase());
    }

    #[test]
    fn test_invitation_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..500).map(|_| generate_invitation_token()).collect();
        assert_eq!(tokens.len(), 500);
    }

    #[test]
    fn test_is_invitation_token_rejects_bad_input() {
        assert!(!is_invitation_token(""));
        assert!(!is_invitation_token("abc"));
        assert!(!is_invitation_token(&"g".repeat(32)));
        assert!(!is_invitation_token(&"a".repeat(33)));
    }

    #[test]
    fn test_session_nonce_is_sha512_hex() {
        let nonce = generate_session_nonce();
        assert_eq!(nonce.len(), 128);
        assert_ne!(nonce, generate_session_nonce());
    }

    #[test]
    fn test_sign_email_roundtrip() {
        let signature = sign_email("secret", "Team@Example.com");
        assert!(verify_email_signature("secret", "team@example.com", &signature));
        assert!(!verify_email_signature("other", "team@example.com", &signature));
        assert!(!verify_email_signature("secret", "else@example.com", &signature));
    }

    #[test]
    fn test_verify_email_signature_rejects_garbage() {
        assert!(!verify_email_signature("secret", "a@b.com", "not-hex"));
        assert!(!verify_email_signature("secret", "a@b.com", ""));
    }

    #[test]
    fn test_email_confirmation_token() {
        let token = email_confirmation_token("secret", "Team@Example.com");
        assert_eq!(
            verify_email_confirmation_token("secret", &token).as_deref(),
            Some("team@example.com")
        );
        assert_eq!(verify_email_confirmation_token("other", &token), None);
        assert_eq!(verify_email_confirmation_token("secret", "nodot"), None);
        assert_eq!(verify_email_confirmation_token("secret", "zz.abc"), None);
    }
}
