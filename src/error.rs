//! Error taxonomy shared by every handler.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        location: Option<&'static str>,
    },

    #[error("Incorrect email or password.")]
    Authentication,

    #[error("Invalid or expired token.")]
    InvalidToken,

    #[error("Your session has ended, please sign in again.")]
    StaleSession,

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    NotFound {
        message: String,
        location: Option<&'static str>,
    },

    #[error("{message}")]
    Conflict {
        message: String,
        location: Option<&'static str>,
    },

    #[error("internal server error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>, location: &'static str) -> Self {
        Self::Validation {
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn not_found(message: impl Into<String>, location: &'static str) -> Self {
        Self::NotFound {
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn conflict(message: impl Into<String>, location: &'static str) -> Self {
        Self::Conflict {
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Authentication | Self::InvalidToken | Self::StaleSession => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Authentication => "AuthenticationError",
            Self::InvalidToken => "InvalidToken",
            Self::StaleSession => "StaleSession",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound { .. } => "NotFound",
            Self::Conflict { .. } => "Conflict",
            Self::Internal(_) => "InternalError",
        }
    }

    pub fn location(&self) -> Option<&'static str> {
        match self {
            Self::Validation { location, .. }
            | Self::NotFound { location, .. }
            | Self::Conflict { location, .. } => *location,
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(anyhow::Error::new(err).context("database request failed"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation {
            message: format!("Malformed request body: {}", rejection.body_text()),
            location: Some("body"),
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub reason: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Storage and hashing details stay in the logs.
            AppError::Internal(source) => {
                error!(error = %format!("{source:#}"), "server returned 500 status");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: status.as_u16(),
            reason: self.reason(),
            message,
            location: self.location(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn conflict_maps_to_422_with_location() {
        let (status, body) =
            body_json(AppError::conflict("Email already in use.", "email")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], 422);
        assert_eq!(body["reason"], "Conflict");
        assert_eq!(body["location"], "email");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let (status, body) =
            body_json(AppError::Internal(anyhow::anyhow!("connection refused on 5432"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("location").is_none());
        assert!(!body.to_string().contains("5432"));
    }

    #[tokio::test]
    async fn session_errors_are_unauthorized() {
        for err in [
            AppError::Authentication,
            AppError::InvalidToken,
            AppError::StaleSession,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
        let (_, body) = body_json(AppError::StaleSession).await;
        assert_eq!(body["reason"], "StaleSession");
        assert!(body["message"].as_str().unwrap().contains("sign in again"));
    }
}
