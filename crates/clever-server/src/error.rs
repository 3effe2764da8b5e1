//! Conversion of sign-in failures into HTTP responses.
//!
//! Flow failures become a plain-text message with status 200, matching what
//! the user sees for a failed login. Unauthenticated access becomes a
//! redirect to the landing page. Details only go to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clever_auth::{CleverError, ErrorKind, SessionError};

use crate::handlers::found;

/// Error returned by request handlers.
#[derive(Debug)]
pub struct AppError(pub CleverError);

impl From<CleverError> for AppError {
    fn from(err: CleverError) -> Self {
        Self(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self(CleverError::Session(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.0;
        match err.kind() {
            ErrorKind::Unauthenticated => found("/"),
            ErrorKind::Session => {
                tracing::error!(error = %err, "Session store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.user_message()).into_response()
            }
            kind => {
                let stage = err
                    .stage()
                    .map_or_else(|| "none".to_string(), |s| s.to_string());
                // A bad callback is the browser's doing; Clever failures deserve attention
                if err.is_external_error() {
                    tracing::warn!(
                        error.kind = %kind,
                        stage = %stage,
                        error = %err,
                        "Clever sign-in failed"
                    );
                } else {
                    tracing::info!(
                        error.kind = %kind,
                        stage = %stage,
                        error = %err,
                        "Sign-in callback rejected"
                    );
                }
                (StatusCode::OK, err.user_message()).into_response()
            }
        }
    }
}
