//! Authentication middleware
//!
//! Extracts the token from the configured header, authenticates it, and makes
//! the resulting [`Authentication`] available to handlers via the request's
//! extensions. Failures short-circuit the request with an error response;
//! handlers never run with a partial identity.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokengate_core::{AuthError, IdentityResolver};
use tracing::warn;

use crate::authenticator::RequestAuthenticator;
use crate::context::Authentication;
use crate::error::AuthRejection;

/// Authentication middleware for `axum::middleware::from_fn_with_state`.
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - The token is malformed, forged or expired
/// - The token is not an access token
/// - The token's subject has no identity
///
/// Requests without a token continue as [`Authentication::Anonymous`].
pub async fn authenticate<R>(
    State(authenticator): State<Arc<RequestAuthenticator<R>>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthRejection>
where
    R: IdentityResolver + 'static,
{
    let (mut parts, body) = request.into_parts();

    // One authentication per request
    if parts.extensions.get::<Authentication<R::User>>().is_some() {
        warn!("Authentication middleware applied twice to the same request");
        return Err(AuthError::Configuration(
            "request has already been authenticated".to_string(),
        )
        .into());
    }

    let authentication = authenticator.authenticate(&parts.headers).await?;
    parts.extensions.insert(authentication);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
