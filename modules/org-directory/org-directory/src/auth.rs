//! Static access key check performed before a query reaches the directory.

use secrecy::{ExposeSecret, SecretString};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("access key is missing")]
    Missing,
    #[error("access key is invalid")]
    Invalid,
}

/// Compares presented keys with the configured one.
pub struct ApiKeyGuard {
    expected: SecretString,
}

impl ApiKeyGuard {
    #[must_use]
    pub fn new(expected: SecretString) -> Self {
        Self { expected }
    }

    /// # Errors
    /// Returns `AuthError::Missing` for an absent or blank key and
    /// `AuthError::Invalid` when the key differs from the configured one.
    pub fn verify(&self, presented: Option<&str>) -> Result<(), AuthError> {
        let presented = presented
            .filter(|k| !k.trim().is_empty())
            .ok_or(AuthError::Missing)?;

        if constant_time_eq(presented.as_bytes(), self.expected.expose_secret().as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }
}

impl std::fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGuard")
            .field("expected", &"[REDACTED]")
            .finish()
    }
}

// Runtime depends on the length only, not on where the first difference is.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
