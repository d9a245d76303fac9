//! Token engine configuration

use std::fmt;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde::Deserialize;

use crate::claims::TokenType;
use crate::error::{AuthError, Result};
use crate::secret::SigningSecret;

/// Default access token lifetime: 10 minutes
pub const DEFAULT_ACCESS_TOKEN_EXPIRATION: u64 = 600;
/// Default refresh token lifetime: 30 days
pub const DEFAULT_REFRESH_TOKEN_EXPIRATION: u64 = 2_592_000;
pub const DEFAULT_TOKEN_PREFIX: &str = "Bearer ";
pub const DEFAULT_HEADER_NAME: &str = "Authorization";

/// HMAC algorithm used to sign tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl SigningAlgorithm {
    pub(crate) fn to_jwt(self) -> Algorithm {
        match self {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Configuration for token issuance and request authentication.
///
/// Keys are kebab-case when deserialized (`access-token-expiration`, `header-name`, ...).
/// Lifetimes are in seconds.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct JwtConfig {
    /// Whether the authentication stack is wired at all
    pub enabled: bool,
    /// Signing key material, at least 256 bits
    pub secret: Option<String>,
    pub access_token_expiration: u64,
    pub refresh_token_expiration: u64,
    /// Prefix stripped from the header value before verification
    pub token_prefix: String,
    /// Header the token is read from
    pub header_name: String,
    pub algorithm: SigningAlgorithm,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret: None,
            access_token_expiration: DEFAULT_ACCESS_TOKEN_EXPIRATION,
            refresh_token_expiration: DEFAULT_REFRESH_TOKEN_EXPIRATION,
            token_prefix: DEFAULT_TOKEN_PREFIX.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
            algorithm: SigningAlgorithm::default(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("enabled", &self.enabled)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("access_token_expiration", &self.access_token_expiration)
            .field("refresh_token_expiration", &self.refresh_token_expiration)
            .field("token_prefix", &self.token_prefix)
            .field("header_name", &self.header_name)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    pub fn with_access_token_expiration(mut self, seconds: u64) -> Self {
        self.access_token_expiration = seconds;
        self
    }

    pub fn with_refresh_token_expiration(mut self, seconds: u64) -> Self {
        self.refresh_token_expiration = seconds;
        self
    }

    pub fn with_token_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.token_prefix = prefix.into();
        self
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validated signing secret
    pub fn signing_secret(&self) -> Result<SigningSecret> {
        match &self.secret {
            Some(secret) => SigningSecret::new(secret.as_bytes()),
            None => Err(AuthError::Configuration(
                "JWT secret is required".to_string(),
            )),
        }
    }

    /// Configured lifetime for a token type
    pub fn lifetime(&self, token_type: TokenType) -> Result<Duration> {
        let (name, seconds) = match token_type {
            TokenType::Access => ("access-token-expiration", self.access_token_expiration),
            TokenType::Refresh => ("refresh-token-expiration", self.refresh_token_expiration),
        };

        if seconds == 0 {
            return Err(AuthError::Configuration(format!(
                "{} must be greater than zero",
                name
            )));
        }

        i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AuthError::Configuration(format!("{} is out of range", name)))
    }

    /// Check every option the engine and authenticator depend on
    pub fn validate(&self) -> Result<()> {
        self.signing_secret()?;
        self.lifetime(TokenType::Access)?;
        self.lifetime(TokenType::Refresh)?;

        if self.header_name.trim().is_empty() {
            return Err(AuthError::Configuration(
                "header-name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "VerySecretKey12345678901234567890";

    #[test]
    fn test_defaults() {
        let config = JwtConfig::default();
        assert!(config.enabled);
        assert!(config.secret.is_none());
        assert_eq!(config.access_token_expiration, 600);
        assert_eq!(config.refresh_token_expiration, 2_592_000);
        assert_eq!(config.token_prefix, "Bearer ");
        assert_eq!(config.header_name, "Authorization");
        assert_eq!(config.algorithm, SigningAlgorithm::HS256);
    }

    #[test]
    fn test_missing_secret_fails_validation() {
        let err = JwtConfig::default().validate().unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let config = JwtConfig::new(SECRET).with_access_token_expiration(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("access-token-expiration"));
    }

    #[test]
    fn test_out_of_range_lifetime_rejected() {
        let config = JwtConfig::new(SECRET).with_refresh_token_expiration(u64::MAX);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_empty_header_name_rejected() {
        let config = JwtConfig::new(SECRET).with_header_name("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lifetimes() {
        let config = JwtConfig::new(SECRET)
            .with_access_token_expiration(5)
            .with_refresh_token_expiration(60);
        assert_eq!(config.lifetime(TokenType::Access).unwrap(), Duration::seconds(5));
        assert_eq!(config.lifetime(TokenType::Refresh).unwrap(), Duration::seconds(60));
    }

    #[test]
    fn test_deserialize_kebab_case_with_defaults() {
        let yaml = r#"
secret: VerySecretKey12345678901234567890
access-token-expiration: 30
header-name: X-Auth-Token
algorithm: HS512
"#;
        let config: JwtConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.access_token_expiration, 30);
        assert_eq!(config.refresh_token_expiration, 2_592_000);
        assert_eq!(config.header_name, "X-Auth-Token");
        assert_eq!(config.token_prefix, "Bearer ");
        assert_eq!(config.algorithm, SigningAlgorithm::HS512);
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let printed = format!("{:?}", JwtConfig::new(SECRET));
        assert!(!printed.contains(SECRET));
        assert!(printed.contains("<redacted>"));
    }
}
