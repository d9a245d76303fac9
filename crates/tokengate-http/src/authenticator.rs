//! Request authentication: header → token → verified claims → identity

use std::sync::Arc;

use axum::http::HeaderMap;
use tokengate_core::{
    AuthError, AuthenticatedIdentity, IdentityResolver, IssuedToken, JwtConfig, Result,
    TokenEngine, TokenType, VerifiedClaims,
};
use tracing::{debug, warn};

use crate::context::Authentication;
use crate::extract::TokenExtractor;

/// Authenticates requests with access tokens.
///
/// The identity resolver is a required constructor argument; there is no
/// fallback resolver.
pub struct RequestAuthenticator<R> {
    engine: Arc<TokenEngine>,
    resolver: R,
    extractor: TokenExtractor,
}

impl<R: IdentityResolver> RequestAuthenticator<R> {
    pub fn new(engine: Arc<TokenEngine>, resolver: R, extractor: TokenExtractor) -> Self {
        Self {
            engine,
            resolver,
            extractor,
        }
    }

    /// Build the engine and extractor from configuration.
    ///
    /// Ignores `enabled`; see [`crate::build_authenticator`] for gated wiring.
    pub fn from_config(config: &JwtConfig, resolver: R) -> Result<Self> {
        let engine = Arc::new(TokenEngine::new(config)?);
        let extractor = TokenExtractor::from_config(config)?;
        Ok(Self::new(engine, resolver, extractor))
    }

    /// Engine used for verification, shared so login handlers can issue tokens
    pub fn engine(&self) -> &Arc<TokenEngine> {
        &self.engine
    }

    pub fn extractor(&self) -> &TokenExtractor {
        &self.extractor
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Authenticate a request from its headers.
    ///
    /// No token means anonymous. A token that fails verification, is not an
    /// access token, or names an unknown subject is an error; no identity is
    /// produced in that case.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Authentication<R::User>> {
        match self.extractor.extract(headers) {
            None => {
                debug!(
                    "No token in '{}' header, treating request as anonymous",
                    self.extractor.header_name()
                );
                Ok(Authentication::Anonymous)
            }
            Some(token) => {
                let identity = self.authenticate_token(token).await?;
                Ok(Authentication::Authenticated(identity))
            }
        }
    }

    /// Authenticate an already-extracted access token
    pub async fn authenticate_token(&self, token: &str) -> Result<AuthenticatedIdentity<R::User>> {
        let claims = self.engine.verify(token)?;
        claims.require_type(TokenType::Access)?;
        self.resolve(claims).await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The subject must still resolve to an identity.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedToken> {
        let claims = self.engine.verify_refresh(refresh_token)?;
        let identity = self.resolve(claims).await?;
        self.engine
            .issue_access(identity.username(), identity.claims().claims())
    }

    async fn resolve(&self, claims: VerifiedClaims) -> Result<AuthenticatedIdentity<R::User>> {
        let subject = claims.subject();

        let user = self
            .resolver
            .lookup(subject)
            .await
            .map_err(|e| AuthError::Resolver(e.to_string()))?;

        match user {
            Some(user) => {
                debug!("Authenticated subject '{}'", subject);
                Ok(AuthenticatedIdentity::new(user, claims))
            }
            None => {
                warn!("Token subject '{}' has no matching identity", subject);
                Err(AuthError::IdentityNotFound(subject.to_string()))
            }
        }
    }
}
