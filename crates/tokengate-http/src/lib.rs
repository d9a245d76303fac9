//! Bearer token authentication for axum services
//!
//! Wires a [`tokengate_core::TokenEngine`] and an application-supplied
//! [`IdentityResolver`] into an axum middleware that authenticates each request.
//!
//! # Usage
//!
//! ```ignore
//! use tokengate_core::JwtConfig;
//! use tokengate_http::{protect, CurrentUser};
//!
//! async fn profile(CurrentUser(identity): CurrentUser<Account>) -> String {
//!     identity.username().to_string()
//! }
//!
//! let router = Router::new().route("/profile", get(profile));
//! let router = protect(router, &config, AccountResolver::new(pool))?;
//! ```
//!
//! Requests without a token reach handlers as [`Authentication::Anonymous`];
//! [`CurrentUser`] turns that into 401 for handlers that need a user.

mod authenticator;
mod context;
mod error;
mod extract;
pub mod middleware;

pub use authenticator::RequestAuthenticator;
pub use context::{Authentication, CurrentUser};
pub use error::{AuthRejection, ErrorResponse};
pub use extract::TokenExtractor;
pub use middleware::authenticate;

use std::sync::Arc;

use axum::{middleware as axum_middleware, Router};
use tokengate_core::{IdentityResolver, JwtConfig, Result};
use tracing::info;

/// Build the request authenticator, or `None` if authentication is disabled.
///
/// Configuration problems (missing or short secret, bad header name) are
/// returned as errors even though nothing has been served yet; callers should
/// refuse to start.
pub fn build_authenticator<R: IdentityResolver>(
    config: &JwtConfig,
    resolver: R,
) -> Result<Option<Arc<RequestAuthenticator<R>>>> {
    if !config.enabled {
        info!("Token authentication is disabled");
        return Ok(None);
    }

    let authenticator = RequestAuthenticator::from_config(config, resolver)?;
    info!(
        "Token authentication enabled (header: {})",
        authenticator.extractor().header_name()
    );
    Ok(Some(Arc::new(authenticator)))
}

/// Layer the authentication middleware onto `router` when enabled
pub fn protect<S, R>(router: Router<S>, config: &JwtConfig, resolver: R) -> Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
    R: IdentityResolver + 'static,
{
    Ok(match build_authenticator(config, resolver)? {
        Some(authenticator) => router.layer(axum_middleware::from_fn_with_state(
            authenticator,
            authenticate::<R>,
        )),
        None => router,
    })
}
