//! Error types for the reservation server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes carried in error response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchReservation = 4,
    BookServiceFailure = 5,
    BookNotAvailable = 6,
    AlreadyCompleted = 7,
    BadValue = 8,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Empty token!")]
    MissingCredential,

    #[error("Invalid token: {0}")]
    InvalidCredential(String),

    #[error("Token signing failed: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("Book service unreachable: {0}")]
    UpstreamUnavailable(String),

    #[error("Book service responded with status {status}")]
    UpstreamError { status: u16 },

    #[error("Malformed book service payload: {0}")]
    DecodeError(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("The book is not available!")]
    NotAvailable,

    #[error("Not access to copmlete reservation!")]
    Forbidden,

    #[error("The reservation is copleted already!")]
    AlreadyCompleted,

    #[error("{context}")]
    StorageFailure {
        context: &'static str,
        #[source]
        source: Box<AppError>,
    },

    #[error("{context}")]
    DependencyFailure {
        context: &'static str,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Whether the error comes from a collaborator rather than the caller
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredential | AppError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::NotAvailable | AppError::AlreadyCompleted => {
                StatusCode::BAD_REQUEST
            }
            AppError::TokenSigning(_)
            | AppError::StorageUnavailable(_)
            | AppError::UpstreamUnavailable(_)
            | AppError::UpstreamError { .. }
            | AppError::DecodeError(_)
            | AppError::StorageFailure { .. }
            | AppError::DependencyFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingCredential | AppError::InvalidCredential(_) | AppError::Forbidden => {
                ErrorCode::NotAuthorized
            }
            AppError::TokenSigning(_) => ErrorCode::Failure,
            AppError::NotFound(_) => ErrorCode::NoSuchReservation,
            AppError::StorageUnavailable(_) | AppError::StorageFailure { .. } => ErrorCode::DbFailure,
            AppError::UpstreamUnavailable(_)
            | AppError::UpstreamError { .. }
            | AppError::DecodeError(_)
            | AppError::DependencyFailure { .. } => ErrorCode::BookServiceFailure,
            AppError::BadRequest(_) => ErrorCode::BadValue,
            AppError::NotAvailable => ErrorCode::BookNotAvailable,
            AppError::AlreadyCompleted => ErrorCode::AlreadyCompleted,
        }
    }

    /// Message shown to the caller; collaborator details stay in the logs
    fn public_message(&self) -> String {
        match self {
            AppError::InvalidCredential(_) => "Invalid token!".to_string(),
            AppError::TokenSigning(_) => "Internal server error".to_string(),
            AppError::StorageUnavailable(_) => "Database error".to_string(),
            AppError::UpstreamUnavailable(_)
            | AppError::UpstreamError { .. }
            | AppError::DecodeError(_) => "Book service error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        match &self {
            AppError::StorageFailure { source, .. } | AppError::DependencyFailure { source, .. } => {
                tracing::error!(error.cause = %source, "{}", self);
            }
            e if e.is_server_error() => tracing::error!("{}", e),
            e => tracing::debug!("Request rejected: {}", e),
        }

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message: self.public_message(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Attach workflow context to collaborator errors
pub trait ResultExt<T> {
    fn storage_failure(self, context: &'static str) -> AppResult<T>;
    fn dependency_failure(self, context: &'static str) -> AppResult<T>;
}

impl<T> ResultExt<T> for AppResult<T> {
    fn storage_failure(self, context: &'static str) -> AppResult<T> {
        self.map_err(|source| AppError::StorageFailure {
            context,
            source: Box::new(source),
        })
    }

    fn dependency_failure(self, context: &'static str) -> AppResult<T> {
        self.map_err(|source| AppError::DependencyFailure {
            context,
            source: Box::new(source),
        })
    }
}
