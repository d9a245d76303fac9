//! Bearer token extraction from request headers
//!
//! # Format
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! Header and prefix are configurable. A missing header or a value that does not
//! start with the prefix means "no token". Whatever follows a matching prefix is
//! returned as is, even when empty, and left to verification to reject.

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderName};
use tokengate_core::{config::DEFAULT_TOKEN_PREFIX, AuthError, JwtConfig, Result};

/// Pulls the raw token out of a configured header
#[derive(Debug, Clone)]
pub struct TokenExtractor {
    /// Header to read (matched case-insensitively)
    header_name: HeaderName,
    /// Prefix that must precede the token (matched exactly)
    prefix: String,
}

impl TokenExtractor {
    pub fn new(header_name: &str, prefix: impl Into<String>) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes()).map_err(|_| {
            AuthError::Configuration(format!("Invalid header name '{}'", header_name))
        })?;

        Ok(Self {
            header_name,
            prefix: prefix.into(),
        })
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self> {
        Self::new(&config.header_name, config.token_prefix.clone())
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Extract the token, or `None` if the request carries none
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let value = headers.get(&self.header_name)?.to_str().ok()?;
        value.strip_prefix(self.prefix.as_str())
    }
}

impl Default for TokenExtractor {
    fn default() -> Self {
        Self {
            header_name: AUTHORIZATION,
            prefix: DEFAULT_TOKEN_PREFIX.to_string(),
        }
    }
}
