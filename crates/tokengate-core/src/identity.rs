//! Identity resolution: mapping a verified subject to a domain user
//!
//! The token engine knows nothing about users. Applications implement
//! [`IdentityResolver`] for their user store and hand it to the request
//! authenticator at construction time.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::claims::VerifiedClaims;

/// A user that can be authenticated with a token
pub trait AuthUser: Clone + Send + Sync + 'static {
    /// Name placed in the `sub` claim at issuance
    fn username(&self) -> &str;

    /// Granted authorities (roles, permissions)
    fn authorities(&self) -> Vec<String>;
}

/// Failure of the identity backend itself (not "user missing")
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ResolverError(String);

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Identity lookup trait
///
/// Given the exact subject string placed in a token at issuance, return the
/// matching user, or `Ok(None)` if no such user exists. Implementations may
/// perform I/O; timeouts and retries are their own concern.
///
/// # Example
///
/// ```ignore
/// use tokengate_core::{async_trait, IdentityResolver, ResolverError};
///
/// struct DbResolver { pool: PgPool }
///
/// #[async_trait]
/// impl IdentityResolver for DbResolver {
///     type User = AccountRow;
///
///     async fn lookup(&self, subject: &str) -> Result<Option<AccountRow>, ResolverError> {
///         sqlx::query_as("SELECT * FROM accounts WHERE username = $1")
///             .bind(subject)
///             .fetch_optional(&self.pool)
///             .await
///             .map_err(|e| ResolverError::new(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    type User: AuthUser;

    async fn lookup(&self, subject: &str) -> Result<Option<Self::User>, ResolverError>;
}

#[async_trait]
impl<R: IdentityResolver + ?Sized> IdentityResolver for Arc<R> {
    type User = R::User;

    async fn lookup(&self, subject: &str) -> Result<Option<Self::User>, ResolverError> {
        (**self).lookup(subject).await
    }
}

/// A resolved user together with the authorities granted to it and the
/// claims of the token it was authenticated with
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity<U> {
    user: U,
    authorities: BTreeSet<String>,
    claims: VerifiedClaims,
}

impl<U: AuthUser> AuthenticatedIdentity<U> {
    pub fn new(user: U, claims: VerifiedClaims) -> Self {
        let authorities = user.authorities().into_iter().collect();
        Self {
            user,
            authorities,
            claims,
        }
    }

    pub fn user(&self) -> &U {
        &self.user
    }

    pub fn into_user(self) -> U {
        self.user
    }

    pub fn username(&self) -> &str {
        self.user.username()
    }

    pub fn authorities(&self) -> &BTreeSet<String> {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    pub fn claims(&self) -> &VerifiedClaims {
        &self.claims
    }
}

/// Map-backed resolver keyed by username
#[derive(Debug, Clone)]
pub struct InMemoryIdentityResolver<U> {
    users: HashMap<String, U>,
}

impl<U: AuthUser> InMemoryIdentityResolver<U> {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user: U) -> Self {
        self.users.insert(user.username().to_string(), user);
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<U: AuthUser> Default for InMemoryIdentityResolver<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: AuthUser> FromIterator<U> for InMemoryIdentityResolver<U> {
    fn from_iter<I: IntoIterator<Item = U>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with_user)
    }
}

#[async_trait]
impl<U: AuthUser> IdentityResolver for InMemoryIdentityResolver<U> {
    type User = U;

    async fn lookup(&self, subject: &str) -> Result<Option<U>, ResolverError> {
        Ok(self.users.get(subject).cloned())
    }
}
