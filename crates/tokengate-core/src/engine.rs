//! Token engine: issues and verifies HMAC-signed access/refresh tokens

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, warn};

use crate::claims::{ClaimSet, TokenPayload, TokenType, VerifiedClaims};
use crate::config::JwtConfig;
use crate::error::{AuthError, Result};

/// Opaque signed token produced by issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken(String);

impl IssuedToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IssuedToken> for String {
    fn from(token: IssuedToken) -> Self {
        token.0
    }
}

impl AsRef<str> for IssuedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Access and refresh token issued together for one subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
}

/// Issues and verifies tokens.
///
/// Holds only the derived keys and lifetimes, fixed at construction, so one
/// instance can be shared across any number of concurrent requests.
pub struct TokenEngine {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl fmt::Debug for TokenEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEngine")
            .field("algorithm", &self.algorithm)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenEngine {
    /// Build an engine from configuration.
    ///
    /// Fails with `AuthError::Configuration` if the secret is missing or shorter
    /// than 256 bits, or a lifetime is unusable. Callers should treat that as fatal.
    pub fn new(config: &JwtConfig) -> Result<Self> {
        config.validate()?;

        let secret = config.signing_secret()?;
        let algorithm = config.algorithm.to_jwt();

        // Signature, structure and required claims only; expiry is checked after
        // decoding so it is never evaluated on an unverified token.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_lifetime: config.lifetime(TokenType::Access)?,
            refresh_lifetime: config.lifetime(TokenType::Refresh)?,
        })
    }

    pub fn lifetime(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        }
    }

    /// Issue a signed token of the given type for `subject`.
    ///
    /// Caller claims named `sub`, `iat`, `exp` or `typ` are dropped in favour of
    /// the engine's own values. An empty subject or a NaN/infinite claim value
    /// fails with `AuthError::InvalidClaims`.
    pub fn issue(&self, subject: &str, claims: &ClaimSet, token_type: TokenType) -> Result<IssuedToken> {
        self.issue_at(subject, claims, token_type, Utc::now())
    }

    pub fn issue_access(&self, subject: &str, claims: &ClaimSet) -> Result<IssuedToken> {
        self.issue(subject, claims, TokenType::Access)
    }

    pub fn issue_refresh(&self, subject: &str, claims: &ClaimSet) -> Result<IssuedToken> {
        self.issue(subject, claims, TokenType::Refresh)
    }

    /// Issue an access and a refresh token sharing the same subject and claims
    pub fn issue_pair(&self, subject: &str, claims: &ClaimSet) -> Result<TokenPair> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.issue_at(subject, claims, TokenType::Access, now)?,
            refresh_token: self.issue_at(subject, claims, TokenType::Refresh, now)?,
        })
    }

    pub(crate) fn issue_at(
        &self,
        subject: &str,
        claims: &ClaimSet,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        if subject.is_empty() {
            return Err(AuthError::InvalidClaims(
                "token subject cannot be empty".to_string(),
            ));
        }

        let unencodable = claims.unencodable();
        if !unencodable.is_empty() {
            return Err(AuthError::InvalidClaims(format!(
                "non-finite number in claim(s): {}",
                unencodable.join(", ")
            )));
        }

        let (claims, dropped) = claims.without_reserved();
        if !dropped.is_empty() {
            warn!(
                "Dropping caller claims that collide with reserved claims: {}",
                dropped.join(", ")
            );
        }

        let issued_at = now.timestamp();
        let expires_at = issued_at + self.lifetime(token_type).num_seconds();

        let payload = TokenPayload {
            sub: subject.to_string(),
            iat: issued_at,
            exp: expires_at,
            typ: token_type,
            claims,
        };

        let token = encode(&Header::new(self.algorithm), &payload, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        debug!(
            "Issued {} token for subject '{}' (expires at {})",
            token_type, subject, expires_at
        );

        Ok(IssuedToken(token))
    }

    /// Verify a token's signature and expiry and decode its claims.
    ///
    /// Does not check the token type; use [`verify_access`](Self::verify_access)
    /// or [`verify_refresh`](Self::verify_refresh) where a type is required.
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_access(&self, token: &str) -> Result<VerifiedClaims> {
        let claims = self.verify(token)?;
        claims.require_type(TokenType::Access)?;
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<VerifiedClaims> {
        let claims = self.verify(token)?;
        claims.require_type(TokenType::Refresh)?;
        Ok(claims)
    }

    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedClaims> {
        let data = decode::<TokenPayload>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::invalid_token()
        })?;

        let claims = VerifiedClaims::from_payload(data.claims);

        if now.timestamp() >= claims.expires_at_timestamp() {
            debug!("Token for subject '{}' has expired", claims.subject());
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The new token keeps the subject and caller claims of the refresh token.
    /// The refresh token itself stays valid until it expires.
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<IssuedToken> {
        let claims = self.verify_refresh(refresh_token)?;
        self.issue_access(claims.subject(), claims.claims())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimValue;
    use chrono::TimeZone;

    const TEST_SECRET: &str = "VerySecretKey12345678901234567890";

    fn engine() -> TokenEngine {
        TokenEngine::new(&JwtConfig::new(TEST_SECRET)).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_construction_requires_secret() {
        let err = TokenEngine::new(&JwtConfig::default()).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));

        let err = TokenEngine::new(&JwtConfig::new("")).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));

        let err = TokenEngine::new(&JwtConfig::new("too-short")).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let engine = engine();
        let claims = ClaimSet::new().with("role", "admin").with("tenant", 42);

        let token = engine.issue_access("alice", &claims).unwrap();
        let verified = engine.verify(token.as_str()).unwrap();

        assert_eq!(verified.subject(), "alice");
        assert_eq!(verified.token_type(), TokenType::Access);
        assert_eq!(verified.claims(), &claims);
        assert_eq!(
            verified.expires_at_timestamp() - verified.issued_at_timestamp(),
            600
        );
    }

    #[test]
    fn test_expiry_arithmetic_per_type() {
        let engine = TokenEngine::new(
            &JwtConfig::new(TEST_SECRET)
                .with_access_token_expiration(30)
                .with_refresh_token_expiration(3600),
        )
        .unwrap();
        let now = at(1_700_000_000);

        let access = engine.issue_at("alice", &ClaimSet::new(), TokenType::Access, now).unwrap();
        let refresh = engine.issue_at("alice", &ClaimSet::new(), TokenType::Refresh, now).unwrap();

        let access = engine.verify_at(access.as_str(), now).unwrap();
        let refresh = engine.verify_at(refresh.as_str(), now).unwrap();

        assert_eq!(access.issued_at_timestamp(), 1_700_000_000);
        assert_eq!(access.expires_at_timestamp(), 1_700_000_030);
        assert_eq!(refresh.expires_at_timestamp(), 1_700_003_600);
        assert!(access.expires_at() > access.issued_at());
    }

    #[test]
    fn test_expired_exactly_at_expiry() {
        let engine = TokenEngine::new(&JwtConfig::new(TEST_SECRET).with_access_token_expiration(10)).unwrap();
        let token = engine
            .issue_at("alice", &ClaimSet::new(), TokenType::Access, at(1000))
            .unwrap();

        assert!(engine.verify_at(token.as_str(), at(1009)).is_ok());
        assert!(matches!(
            engine.verify_at(token.as_str(), at(1010)),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn test_identical_claims_are_deterministic() {
        let engine = engine();
        let now = at(1_700_000_000);
        let claims = ClaimSet::new().with("b", 1).with("a", "x");

        let first = engine.issue_at("alice", &claims, TokenType::Access, now).unwrap();
        let second = engine.issue_at("alice", &claims, TokenType::Access, now).unwrap();
        assert_eq!(first, second);

        let other = engine
            .issue_at("alice", &claims.clone().with("c", true), TokenType::Access, now)
            .unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_reserved_claims_take_precedence() {
        let engine = engine();
        let claims = ClaimSet::new()
            .with("sub", "mallory")
            .with("typ", "ACCESS")
            .with("exp", 9_999_999_999_i64)
            .with("role", "user");

        let token = engine.issue_refresh("bob", &claims).unwrap();
        let verified = engine.verify(token.as_str()).unwrap();

        assert_eq!(verified.subject(), "bob");
        assert_eq!(verified.token_type(), TokenType::Refresh);
        assert!(verified.expires_at_timestamp() < 9_999_999_999);
        assert_eq!(verified.claims().len(), 1);
        assert_eq!(verified.claim("role"), Some(&ClaimValue::from("user")));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let err = engine().issue_access("", &ClaimSet::new()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaims(_)));
        assert!(err.to_string().contains("subject"));
    }

    #[test]
    fn test_non_finite_claims_rejected_at_issue() {
        let engine = engine();

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let claims = ClaimSet::new().with("score", value);
            let err = engine.issue_access("alice", &claims).unwrap_err();
            assert!(matches!(err, AuthError::InvalidClaims(ref m) if m.contains("score")));
            assert!(engine.issue_pair("alice", &claims).is_err());
        }

        // Finite floats still round-trip
        let claims = ClaimSet::new().with("score", 0.75);
        let token = engine.issue_access("alice", &claims).unwrap();
        let verified = engine.verify(token.as_str()).unwrap();
        assert_eq!(verified.claim("score"), Some(&ClaimValue::Float(0.75)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let engine = engine();
        for token in ["invalid.token.here", "abc", "a.b", "..", "a.b.c.d"] {
            assert!(
                matches!(engine.verify(token), Err(AuthError::InvalidToken(_))),
                "{token} should be invalid"
            );
        }
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let other = TokenEngine::new(&JwtConfig::new("AnotherSecretKey1234567890123456789")).unwrap();
        let token = other.issue_access("alice", &ClaimSet::new()).unwrap();

        assert!(matches!(
            engine().verify(token.as_str()),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_algorithm_mismatch_is_invalid() {
        let hs512 = TokenEngine::new(
            &JwtConfig::new(TEST_SECRET).with_algorithm(crate::config::SigningAlgorithm::HS512),
        )
        .unwrap();
        let token = hs512.issue_access("alice", &ClaimSet::new()).unwrap();

        assert!(hs512.verify(token.as_str()).is_ok());
        assert!(matches!(
            engine().verify(token.as_str()),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_typed_verification() {
        let engine = engine();
        let access = engine.issue_access("alice", &ClaimSet::new()).unwrap();
        let refresh = engine.issue_refresh("alice", &ClaimSet::new()).unwrap();

        assert!(engine.verify_access(access.as_str()).is_ok());
        assert!(engine.verify_refresh(refresh.as_str()).is_ok());

        let err = engine.verify_access(refresh.as_str()).unwrap_err();
        assert!(err.to_string().contains("Invalid token type"));
        assert!(matches!(
            engine.verify_refresh(access.as_str()),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_refresh_access_token() {
        let engine = engine();
        let claims = ClaimSet::new().with("role", "admin");
        let pair = engine.issue_pair("carol", &claims).unwrap();

        let access = engine.refresh_access_token(pair.refresh_token.as_str()).unwrap();
        let verified = engine.verify_access(access.as_str()).unwrap();
        assert_eq!(verified.subject(), "carol");
        assert_eq!(verified.claims(), &claims);

        let err = engine.refresh_access_token(pair.access_token.as_str()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let printed = format!("{:?}", engine());
        assert!(!printed.contains(TEST_SECRET));
        assert!(printed.contains("HS256"));
    }
}
