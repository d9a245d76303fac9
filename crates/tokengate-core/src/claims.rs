//! Claim model: token types, caller claim sets and verified claims

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Claim name carrying the subject
pub const SUBJECT_CLAIM: &str = "sub";
/// Claim name carrying the issued-at time (epoch seconds)
pub const ISSUED_AT_CLAIM: &str = "iat";
/// Claim name carrying the expiry time (epoch seconds)
pub const EXPIRY_CLAIM: &str = "exp";
/// Claim name carrying the token type
pub const TYPE_CLAIM: &str = "typ";

/// Claims the engine always sets itself. Caller claims with these names are dropped.
pub const RESERVED_CLAIMS: [&str; 4] = [SUBJECT_CLAIM, ISSUED_AT_CLAIM, EXPIRY_CLAIM, TYPE_CLAIM];

/// Kind of token, carried in the `typ` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    /// Grants access to protected resources
    Access,
    /// Only exchangeable for a new access token
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "ACCESS",
            TokenType::Refresh => "REFRESH",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACCESS" => Ok(TokenType::Access),
            "REFRESH" => Ok(TokenType::Refresh),
            other => Err(format!("unknown token type '{}'", other)),
        }
    }
}

/// A single flat claim value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimValue::Bool(b) => write!(f, "{}", b),
            ClaimValue::Integer(i) => write!(f, "{}", i),
            ClaimValue::Float(x) => write!(f, "{}", x),
            ClaimValue::String(s) => f.write_str(s),
        }
    }
}

impl ClaimValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ClaimValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ClaimValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ClaimValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// False for NaN and infinite floats, which JSON cannot carry
    pub fn is_encodable(&self) -> bool {
        match self {
            ClaimValue::Float(x) => x.is_finite(),
            _ => true,
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::String(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Integer(value)
    }
}

impl From<i32> for ClaimValue {
    fn from(value: i32) -> Self {
        ClaimValue::Integer(value.into())
    }
}

impl From<f64> for ClaimValue {
    fn from(value: f64) -> Self {
        ClaimValue::Float(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        ClaimValue::Bool(value)
    }
}

/// Caller-supplied claims, keyed by claim name.
///
/// Ordered so that identical claim sets always serialize to identical payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(BTreeMap<String, ClaimValue>);

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a claim, replacing any previous value under the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ClaimValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClaimValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split off any claims whose names collide with reserved claims.
    ///
    /// Returns the remaining claims and the names that were dropped.
    pub(crate) fn without_reserved(&self) -> (ClaimSet, Vec<String>) {
        let mut kept = BTreeMap::new();
        let mut dropped = Vec::new();
        for (name, value) in &self.0 {
            if RESERVED_CLAIMS.contains(&name.as_str()) {
                dropped.push(name.clone());
            } else {
                kept.insert(name.clone(), value.clone());
            }
        }
        (ClaimSet(kept), dropped)
    }

    /// Names of claims whose values cannot be encoded
    pub(crate) fn unencodable(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_encodable())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for ClaimSet
where
    K: Into<String>,
    V: Into<ClaimValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ClaimSet(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Wire payload: reserved claims plus flattened caller claims
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenPayload {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub typ: TokenType,
    #[serde(flatten)]
    pub claims: ClaimSet,
}

/// Decoded claims of a token whose signature verified and which has not expired.
///
/// Only the token engine produces these.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    subject: String,
    issued_at: i64,
    expires_at: i64,
    token_type: TokenType,
    claims: ClaimSet,
}

impl VerifiedClaims {
    pub(crate) fn from_payload(payload: TokenPayload) -> Self {
        Self {
            subject: payload.sub,
            issued_at: payload.iat,
            expires_at: payload.exp,
            token_type: payload.typ,
            claims: payload.claims,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Issued-at, epoch seconds
    pub fn issued_at_timestamp(&self) -> i64 {
        self.issued_at
    }

    /// Expiry, epoch seconds
    pub fn expires_at_timestamp(&self) -> i64 {
        self.expires_at
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.issued_at, 0).unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.expires_at, 0).unwrap_or_default()
    }

    /// Caller-supplied claims (reserved claims excluded)
    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name)
    }

    /// Reject the token unless it is of the `expected` type
    pub fn require_type(&self, expected: TokenType) -> Result<()> {
        if self.token_type != expected {
            return Err(AuthError::InvalidToken(format!(
                "Invalid token type: expected {}, got {}",
                expected, self.token_type
            )));
        }
        Ok(())
    }
}
