//! Translation of authentication failures into HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokengate_core::AuthError;
use tracing::error;

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Rejection returned by the authentication middleware and extractors
#[derive(Debug)]
pub enum AuthRejection {
    /// The token engine, resolver or configuration failed
    Auth(AuthError),
    /// A handler required an identity but the request is anonymous
    Unauthenticated,
    /// A handler asked for the authentication context but no middleware installed one
    MissingContext,
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        AuthRejection::Auth(err)
    }
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthRejection::Auth(err) if err.is_authentication_failure() => StatusCode::UNAUTHORIZED,
            AuthRejection::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthRejection::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthRejection::MissingContext => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthRejection::Auth(AuthError::InvalidToken(_)) => "INVALID_TOKEN",
            AuthRejection::Auth(AuthError::ExpiredToken) => "TOKEN_EXPIRED",
            AuthRejection::Auth(AuthError::IdentityNotFound(_)) => "IDENTITY_NOT_FOUND",
            AuthRejection::Auth(AuthError::Configuration(_)) => "CONFIGURATION_ERROR",
            AuthRejection::Auth(AuthError::InvalidClaims(_)) => "INVALID_CLAIMS",
            AuthRejection::Auth(AuthError::Signing(_)) => "SIGNING_ERROR",
            AuthRejection::Auth(AuthError::Resolver(_)) => "IDENTITY_BACKEND_ERROR",
            AuthRejection::Unauthenticated => "UNAUTHENTICATED",
            AuthRejection::MissingContext => "CONFIGURATION_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            AuthRejection::Auth(AuthError::IdentityNotFound(_)) => {
                "Authenticated identity not found".to_string()
            }
            AuthRejection::Auth(err) if err.is_authentication_failure() => err.to_string(),
            AuthRejection::Auth(_) | AuthRejection::MissingContext => {
                "Internal authentication error".to_string()
            }
            AuthRejection::Unauthenticated => "Authentication required".to_string(),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Authentication failed with internal error: {:?}", self);
        }

        let body = ErrorResponse {
            error: self.message(),
            code: Some(self.code().to_string()),
        };

        (status, Json(body)).into_response()
    }
}
