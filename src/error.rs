use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with. Infrastructure errors are converted
/// into one of these at the boundary; none of them leak raw sqlx/reqwest
/// errors to the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Username already registered")]
    DuplicateUsername,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not logged in")]
    Unauthenticated,
    #[error("No active round")]
    NoActiveRound,
    #[error("Card provider unavailable")]
    ProviderUnavailable,
    #[error("Storage unavailable")]
    StorageUnavailable(#[source] sqlx::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateUsername => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NoActiveRound => StatusCode::CONFLICT,
            AppError::ProviderUnavailable => StatusCode::BAD_GATEWAY,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::StorageUnavailable(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, %status, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
