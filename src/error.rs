use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error taxonomy shared by every handler. Authentication and authorization
/// failures short-circuit before business logic; validation runs before any
/// persistence access; unexpected failures are logged and surfaced as a
/// generic 500 so infrastructure details never reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid bearer token. 401 for a missing token,
    /// 403 for one that fails to decode or verify.
    #[error("{message}")]
    Authentication { status: StatusCode, message: String },

    /// Verified identity, but not the owner of the target resource.
    #[error("{0}")]
    Authorization(String),

    /// Malformed or incomplete request input.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    pub fn token_missing() -> Self {
        Self::Authentication {
            status: StatusCode::UNAUTHORIZED,
            message: "Token missing".into(),
        }
    }

    pub fn token_invalid() -> Self {
        Self::Authentication {
            status: StatusCode::FORBIDDEN,
            message: "Invalid token".into(),
        }
    }

    pub fn not_authorized() -> Self {
        Self::Authorization("Not authorized".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authentication { status, .. } => *status,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Unexpected(e) => {
                error!(error = %e, "unexpected server error");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
