//! Secret string type for safe credential handling.
//!
//! Wraps the identity credential so it cannot leak through debug output,
//! logs, or error messages.

use std::fmt;

use serde::Deserialize;

/// A wrapper for secrets that prevents accidental logging.
///
/// `Debug` and `Display` render `[REDACTED]`; the actual value requires an
/// explicit `expose_secret()` call. Memory is cleared on drop (best-effort,
/// not cryptographically secure).
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret from any string-like value.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Explicitly expose the secret value.
    ///
    /// Only call this where the credential is actually needed, such as when
    /// building an Authorization header.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // The compiler may optimize this away; good enough for log hygiene,
        // use zeroize if stronger guarantees are ever needed.
        self.0.clear();
        self.0.shrink_to_fit();
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::new("bearer-credential");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_expose_secret() {
        let secret = SecretString::new("bearer-credential");
        assert_eq!(secret.expose_secret(), "bearer-credential");
    }
}
