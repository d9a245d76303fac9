//! Stateless token lifecycle for bearer authentication
//!
//! Issues HMAC-signed access and refresh tokens, verifies them (signature first,
//! then expiry), and hands back the decoded claims. Token type lives in the `typ`
//! claim; enforcing it is up to the caller (see [`VerifiedClaims::require_type`]).
//!
//! ```
//! use tokengate_core::{ClaimSet, JwtConfig, TokenEngine, TokenType};
//!
//! let engine = TokenEngine::new(&JwtConfig::new("VerySecretKey12345678901234567890")).unwrap();
//! let token = engine
//!     .issue("alice", &ClaimSet::new().with("role", "admin"), TokenType::Access)
//!     .unwrap();
//!
//! let claims = engine.verify(token.as_str()).unwrap();
//! assert_eq!(claims.subject(), "alice");
//! assert_eq!(claims.token_type(), TokenType::Access);
//! ```

pub mod claims;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod secret;

pub use claims::{ClaimSet, ClaimValue, TokenType, VerifiedClaims, RESERVED_CLAIMS};
pub use config::{JwtConfig, SigningAlgorithm};
pub use engine::{IssuedToken, TokenEngine, TokenPair};
pub use error::{AuthError, Result};
pub use identity::{
    AuthUser, AuthenticatedIdentity, IdentityResolver, InMemoryIdentityResolver, ResolverError,
};
pub use secret::{SigningSecret, MIN_SECRET_BYTES};

// Re-export useful types
pub use async_trait::async_trait;
