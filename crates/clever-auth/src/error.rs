//! Error types for the Clever sign-in flow.
//!
//! Every outbound failure is tagged with the [`FlowStage`] it happened in so
//! the HTTP layer can pick the matching user-facing message.

use std::fmt;

use crate::session::SessionError;

/// Message shown when anything up to and including the token exchange fails.
pub const LOGIN_FAILED_MESSAGE: &str = "An error occurred with your login. Please try again.";

/// Message shown when the profile fetch fails after a successful exchange.
pub const PROFILE_FAILED_MESSAGE: &str =
    "An error occurred trying to retrieve your information. Please try again.";

/// The step of the sign-in flow an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    /// `POST /oauth/tokens`.
    TokenExchange,
    /// `GET /me`.
    ProfileFetch,
}

impl FlowStage {
    /// Returns the message shown to the user when this stage fails.
    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            Self::TokenExchange => LOGIN_FAILED_MESSAGE,
            Self::ProfileFetch => PROFILE_FAILED_MESSAGE,
        }
    }
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExchange => write!(f, "token exchange"),
            Self::ProfileFetch => write!(f, "profile fetch"),
        }
    }
}

/// Coarse classification of a [`CleverError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, DNS, TLS or timeout failure talking to Clever.
    Transport,
    /// Clever answered with a non-success status or an OAuth error.
    Provider,
    /// Clever answered with success but without the expected fields.
    MalformedResponse,
    /// The callback arrived without an authorization code.
    MissingCode,
    /// A protected page was requested without a session.
    Unauthenticated,
    /// The session store rejected a read or write.
    Session,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Provider => write!(f, "provider"),
            Self::MalformedResponse => write!(f, "malformed_response"),
            Self::MissingCode => write!(f, "missing_code"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// Errors that can occur while signing a user in with Clever.
#[derive(Debug, thiserror::Error)]
pub enum CleverError {
    /// The redirect carried no `code` parameter (or an empty one).
    #[error("Authorization code missing from callback")]
    MissingCode,

    /// The request to Clever did not complete.
    #[error("Transport error during {stage}: {source}")]
    Transport {
        /// Stage the request belonged to.
        stage: FlowStage,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// Clever rejected the request.
    #[error("Provider rejected {stage}: {message}")]
    Provider {
        /// Stage the request belonged to.
        stage: FlowStage,
        /// HTTP status, absent when the error came back on the redirect.
        status: Option<u16>,
        /// Description assembled from the status and the OAuth error body.
        message: String,
    },

    /// Clever answered with success but the body was not usable.
    #[error("Malformed {stage} response: {reason}")]
    MalformedResponse {
        /// Stage the response belonged to.
        stage: FlowStage,
        /// What was wrong with the body.
        reason: String,
    },

    /// No authenticated user in the session.
    #[error("No authenticated session")]
    Unauthenticated,

    /// The session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl CleverError {
    /// Creates a `Transport` error.
    #[must_use]
    pub fn transport(stage: FlowStage, source: reqwest::Error) -> Self {
        Self::Transport { stage, source }
    }

    /// Creates a `Provider` error from an HTTP status and the OAuth error body, if any.
    #[must_use]
    pub fn provider_status(
        stage: FlowStage,
        status: u16,
        error: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        let message = match (error, description) {
            (Some(error), Some(description)) => format!("HTTP {status} - {error}: {description}"),
            (Some(error), None) => format!("HTTP {status} - {error}"),
            _ => format!("HTTP {status}"),
        };
        Self::Provider {
            stage,
            status: Some(status),
            message,
        }
    }

    /// Creates a `Provider` error for an `error` returned on the authorization redirect.
    #[must_use]
    pub fn provider_denied(error: impl Into<String>) -> Self {
        Self::Provider {
            stage: FlowStage::TokenExchange,
            status: None,
            message: error.into(),
        }
    }

    /// Creates a `MalformedResponse` error.
    #[must_use]
    pub fn malformed(stage: FlowStage, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            stage,
            reason: reason.into(),
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCode => ErrorKind::MissingCode,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Session(_) => ErrorKind::Session,
        }
    }

    /// Returns the flow stage the error belongs to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<FlowStage> {
        match self {
            Self::MissingCode => Some(FlowStage::TokenExchange),
            Self::Transport { stage, .. }
            | Self::Provider { stage, .. }
            | Self::MalformedResponse { stage, .. } => Some(*stage),
            Self::Unauthenticated | Self::Session(_) => None,
        }
    }

    /// Returns the plain-text message shown to the end user.
    ///
    /// Internal details (status codes, provider error bodies) never reach the user.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        self.stage()
            .map_or(LOGIN_FAILED_MESSAGE, FlowStage::user_message)
    }

    /// Returns `true` if this error came from talking to Clever.
    #[must_use]
    pub fn is_external_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Provider { .. } | Self::MalformedResponse { .. }
        )
    }
}
