use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use suggestor_core::error::CoreError;
use suggestor_db::StoreError;
use suggestor_wiki::WikiError;

use crate::engine::ModerationError;
use crate::session::SessionError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the error of every layer below and implements [`IntoResponse`]:
/// the body is plain text carrying the error message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `suggestor_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Wiki(#[from] WikiError),

    #[error(transparent)]
    Moderation(#[from] ModerationError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core(core) => core_status(core),
            AppError::Session(SessionError::Encoding(_) | SessionError::Encryption) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Session(_) => StatusCode::BAD_REQUEST,
            AppError::Store(store) => store_status(store),
            AppError::Wiki(wiki) => wiki_status(wiki),
            AppError::Moderation(moderation) => match moderation {
                ModerationError::NotFound(_) => StatusCode::NOT_FOUND,
                ModerationError::AlreadyApproved(_)
                | ModerationError::LoggedOut
                | ModerationError::Validation(_) => StatusCode::BAD_REQUEST,
                ModerationError::Wiki(wiki) => wiki_status(wiki),
                ModerationError::Store(store) => store_status(store),
                ModerationError::Unreconciled { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
        }

        (status, message).into_response()
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn wiki_status(err: &WikiError) -> StatusCode {
    match err {
        WikiError::InvalidGrant(_) | WikiError::MissingCredential(_) | WikiError::LoggedOut => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
