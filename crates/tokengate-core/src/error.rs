//! Authentication error taxonomy
//!
//! Every failure the token engine or the request authenticator can raise is one
//! of these variants. The HTTP boundary switches on them to decide the response.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or unusable configuration (e.g. secret absent or shorter than 256 bits).
    /// Raised at construction time only.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed token, bad signature, or wrong token type for the operation.
    #[error("{0}")]
    InvalidToken(String),

    /// Signature is valid but the token is past its expiry.
    #[error("Token has expired")]
    ExpiredToken,

    /// The token verified but its subject has no backing identity.
    #[error("Identity not found for subject '{0}'")]
    IdentityNotFound(String),

    /// Issuance was asked to sign something that could never verify
    /// (empty subject, non-finite number).
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    /// The JWT library could not serialize or sign the claims.
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// The identity backend failed while looking up a subject.
    #[error("Identity lookup failed: {0}")]
    Resolver(String),
}

impl AuthError {
    pub(crate) fn invalid_token() -> Self {
        AuthError::InvalidToken("Invalid JWT token".to_string())
    }

    /// True for failures a client can fix by re-authenticating (or refreshing).
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidToken(_) | AuthError::ExpiredToken | AuthError::IdentityNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
