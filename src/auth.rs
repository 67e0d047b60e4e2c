//! Shared-secret access gate.
//!
//! A single password guards the whole tool. It is read from the environment
//! at start-up; when none is configured the gate is open.

use crate::error::DrawingError;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Environment variable holding the shared secret.
pub const APP_PASSWORD_ENV: &str = "DRAWING2PDF_APP_PASSWORD";

/// Password check run before any other processing.
#[derive(Clone, Default)]
pub struct AccessGate {
    secret: Option<String>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl AccessGate {
    /// A gate that checks against `secret`. An empty secret disables it.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            secret: (!secret.is_empty()).then_some(secret),
        }
    }

    /// An open gate.
    pub fn open() -> Self {
        Self { secret: None }
    }

    /// Read the secret from [`APP_PASSWORD_ENV`].
    pub fn from_env() -> Self {
        std::env::var(APP_PASSWORD_ENV)
            .map(Self::new)
            .unwrap_or_else(|_| Self::open())
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Check a candidate password.
    pub fn verify(&self, candidate: Option<&str>) -> Result<(), DrawingError> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };
        match candidate {
            None | Some("") => Err(DrawingError::AccessDenied("password required".into())),
            Some(c) if secrets_match(c.as_bytes(), secret.as_bytes()) => Ok(()),
            Some(_) => {
                warn!("Rejected access attempt with an incorrect password");
                Err(DrawingError::AccessDenied("incorrect password".into()))
            }
        }
    }
}

/// Compare without short-circuiting on the first differing byte.
fn secrets_match(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_gate_allows_anything() {
        let gate = AccessGate::open();
        assert!(!gate.is_enabled());
        assert!(gate.verify(None).is_ok());
        assert!(gate.verify(Some("whatever")).is_ok());
    }

    #[test]
    fn empty_secret_means_open() {
        assert!(!AccessGate::new("").is_enabled());
    }

    #[test]
    fn correct_password_passes() {
        let gate = AccessGate::new("s3cret");
        assert!(gate.verify(Some("s3cret")).is_ok());
    }

    #[test]
    fn missing_password_is_denied() {
        let gate = AccessGate::new("s3cret");
        let err = gate.verify(None).unwrap_err();
        assert!(err.to_string().contains("password required"));
        assert!(gate.verify(Some("")).is_err());
    }

    #[test]
    fn wrong_password_is_denied() {
        let gate = AccessGate::new("s3cret");
        let err = gate.verify(Some("s3creT")).unwrap_err();
        assert!(err.to_string().contains("incorrect password"));
        assert!(gate.verify(Some("s3cret ")).is_err());
        assert!(gate.verify(Some("s3cre")).is_err());
    }

    #[test]
    fn secrets_match_cases() {
        assert!(secrets_match(b"abc", b"abc"));
        assert!(!secrets_match(b"abc", b"abd"));
        assert!(!secrets_match(b"abc", b"abcd"));
        assert!(!secrets_match(b"", b"a"));
        assert!(secrets_match(b"", b""));
        assert!(!secrets_match(&[b'a'; 256], &[b'a'; 512]));
        assert!(AccessGate::new("abc").verify(Some("abcd")).is_err());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let dbg = format!("{:?}", AccessGate::new("s3cret"));
        assert!(!dbg.contains("s3cret"));
    }
}
