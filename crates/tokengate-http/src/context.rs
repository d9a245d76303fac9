//! Per-request authentication context
//!
//! The middleware installs exactly one [`Authentication`] into each request's
//! extensions. It lives and dies with the request; nothing is shared between
//! requests. Handlers read it back with the [`Authentication`] or
//! [`CurrentUser`] extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use tokengate_core::{AuthUser, AuthenticatedIdentity};

use crate::error::AuthRejection;

/// Outcome of authenticating one request
#[derive(Debug, Clone)]
pub enum Authentication<U> {
    /// No token was presented
    Anonymous,
    /// A valid access token resolved to a known user
    Authenticated(AuthenticatedIdentity<U>),
}

impl<U: AuthUser> Authentication<U> {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Authentication::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&AuthenticatedIdentity<U>> {
        match self {
            Authentication::Anonymous => None,
            Authentication::Authenticated(identity) => Some(identity),
        }
    }

    pub fn into_identity(self) -> Option<AuthenticatedIdentity<U>> {
        match self {
            Authentication::Anonymous => None,
            Authentication::Authenticated(identity) => Some(identity),
        }
    }
}

impl<S, U> FromRequestParts<S> for Authentication<U>
where
    S: Send + Sync,
    U: AuthUser,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authentication<U>>()
            .cloned()
            .ok_or(AuthRejection::MissingContext)
    }
}

/// Extractor for handlers that require an authenticated user.
///
/// Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser<U>(pub AuthenticatedIdentity<U>);

impl<U> std::ops::Deref for CurrentUser<U> {
    type Target = AuthenticatedIdentity<U>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, U> FromRequestParts<S> for CurrentUser<U>
where
    S: Send + Sync,
    U: AuthUser,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Authentication::<U>::from_request_parts(parts, state).await? {
            Authentication::Authenticated(identity) => Ok(CurrentUser(identity)),
            Authentication::Anonymous => Err(AuthRejection::Unauthenticated),
        }
    }
}
