//! Signing secret handling

use std::fmt;

use crate::error::{AuthError, Result};

/// Minimum secret length for HMAC signing (256 bits)
pub const MIN_SECRET_BYTES: usize = 32;

/// HMAC key material, validated for length.
///
/// The bytes are only handed to the JWT key constructors; `Debug` never prints them.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AuthError::Configuration(
                "JWT secret cannot be empty".to_string(),
            ));
        }
        if bytes.len() < MIN_SECRET_BYTES {
            return Err(AuthError::Configuration(format!(
                "JWT secret must be at least {} bits ({} bytes), got {} bytes",
                MIN_SECRET_BYTES * 8,
                MIN_SECRET_BYTES,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_rejected() {
        let err = SigningSecret::new(Vec::new()).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = SigningSecret::new("thirty-one-bytes-long-secret-xx").unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
        assert!(err.to_string().contains("256 bits"));
    }

    #[test]
    fn test_exactly_256_bits_accepted() {
        let secret = SigningSecret::new("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(secret.len(), 32);
    }

    #[test]
    fn test_debug_redacts_bytes() {
        let secret = SigningSecret::new("super-secret-value-that-is-long-enough").unwrap();
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("redacted"));
    }
}
