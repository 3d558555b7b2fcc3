use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Stable JSON body for every non-2xx response (and for logout).
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, empty or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Another record already owns this email.
    #[error("Email already registered.")]
    EmailTaken,

    /// Signin failed. Unknown email and wrong password share this variant
    /// so callers cannot probe which addresses have accounts.
    #[error("Invalid credentials.")]
    InvalidCredentials,

    /// Missing, invalid or expired bearer token.
    #[error("Invalid or expired token.")]
    Unauthorized,

    /// Anything from the lower layers. The caller sees a generic message;
    /// the detail stays in the server log.
    #[error("Server error, please try again later.")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::EmailTaken => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            ApiError::Internal(source) => {
                tracing::error!(error = ?source, "request failed");
            }
            ApiError::InvalidCredentials => {
                tracing::warn!("invalid credentials");
            }
            _ => {
                tracing::debug!(error = %self, "request rejected");
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(MessageResponse {
            message: self.to_string(),
        });
        (self.status_code(), body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                return ApiError::EmailTaken;
            }
        }
        ApiError::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::EmailTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused (db=10.0.0.3)"));
        let msg = err.to_string();
        assert_eq!(msg, "Server error, please try again later.");
        assert!(!msg.contains("10.0.0.3"));
    }
}
