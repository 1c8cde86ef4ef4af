//! Session key rules.
//!
//! Keys name conversations in URLs and, for the file store, on disk, so
//! they are restricted to a filename-safe alphabet.

use sq_domain::error::{Error, Result};

pub const MAX_SESSION_KEY_LEN: usize = 128;

/// Accept `[A-Za-z0-9_.-]{1,128}` not starting with a dot.
pub fn validate_session_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::Other("session key must not be empty".into()));
    }
    if key.len() > MAX_SESSION_KEY_LEN {
        return Err(Error::Other(format!(
            "session key exceeds {MAX_SESSION_KEY_LEN} characters"
        )));
    }
    if key.starts_with('.') {
        return Err(Error::Other("session key must not start with '.'".into()));
    }
    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(Error::Other(format!(
            "session key contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

/// Fresh random key for callers that did not supply one.
pub fn new_session_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_keys() {
        for key in ["default", "user-42", "web_7f3a", "a.b", "0"] {
            assert!(validate_session_key(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn rejects_path_like_keys() {
        for key in ["", ".", "..", "../etc/passwd", "a/b", "a\\b", ".hidden"] {
            assert!(validate_session_key(key).is_err(), "{key}");
        }
    }

    #[test]
    fn rejects_overlong_keys() {
        let key = "k".repeat(MAX_SESSION_KEY_LEN + 1);
        assert!(validate_session_key(&key).is_err());
        assert!(validate_session_key(&key[1..]).is_ok());
    }

    #[test]
    fn generated_keys_are_valid_and_distinct() {
        let a = new_session_key();
        let b = new_session_key();
        assert!(validate_session_key(&a).is_ok());
        assert_ne!(a, b);
    }
}
