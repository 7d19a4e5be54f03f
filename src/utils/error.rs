use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::repository::RepositoryError;
use crate::services::identity::IdentityError;
use crate::services::token::TokenError;
use crate::utils::response::error as error_response;

/// Message returned for every token parse or signature failure. The client is
/// never told which part of the token was rejected.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid QR signature or format";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid token")]
    InvalidToken(#[from] TokenError),

    #[error("Ticket belongs to a different event")]
    WrongEvent,

    #[error("Ticket has no valid date")]
    NoValidDate,

    #[error("Authentication error: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Repository error")]
    RepositoryError(#[from] RepositoryError),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_)
            | AppError::InvalidToken(_)
            | AppError::WrongEvent
            | AppError::NoValidDate => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RepositoryError(_)
            | AppError::ExternalServiceError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::InvalidToken(_) => "invalid_token",
            AppError::WrongEvent => "wrong_event",
            AppError::NoValidDate => "no_valid_date",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::RepositoryError(_)
            | AppError::ExternalServiceError(_)
            | AppError::InternalServerError(_) => "internal_error",
        }
    }

    fn log(&self) {
        match self {
            AppError::InvalidRequest(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::InvalidToken(e) => {
                warn!(code = self.code(), reason = %e, "Request rejected");
            }
            AppError::WrongEvent | AppError::NoValidDate => {
                warn!(code = self.code(), "Request rejected");
            }
            AppError::RepositoryError(e) => {
                error!(error = ?e, "Repository error");
            }
            AppError::ExternalServiceError(msg) | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
        }
    }

    /// Message safe to show to the scanner client.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidRequest(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidToken(_) => INVALID_TOKEN_MESSAGE.to_string(),
            AppError::WrongEvent => "Ticket is not valid for this event".to_string(),
            AppError::NoValidDate => "Ticket has no admission date".to_string(),
            AppError::RepositoryError(_)
            | AppError::ExternalServiceError(_)
            | AppError::InternalServerError(_) => "Internal server error".to_string(),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Expired | IdentityError::Invalid => {
                AppError::Unauthenticated("Invalid or expired credentials".to_string())
            }
            IdentityError::Unavailable(msg) => AppError::ExternalServiceError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        error_response(code, self.public_message(), status)
    }
}
