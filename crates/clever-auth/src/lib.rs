//! # clever-auth
//!
//! Sign-in with Clever for the instant login server.
//!
//! This crate provides:
//! - Authorization URL construction for the Clever `/oauth/authorize` page
//! - Authorization-code exchange against the Clever token endpoint
//! - Profile retrieval from the Clever `/me` endpoint
//! - The user session model and the session store seam
//!
//! ## Flow
//!
//! ```text
//! landing page ──► https://clever.com/oauth/authorize?response_type=code&...
//!                              │
//!                              ▼
//! GET /redirect?code=... ──► POST /oauth/tokens ──► GET /me ──► session
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Provider endpoints and client credentials
//! - [`authorize`] - Authorization redirect builder
//! - [`token`] - Authorization code exchange
//! - [`profile`] - User profile retrieval
//! - [`client`] - The composed sign-in flow
//! - [`session`] - User session model and storage
//! - [`error`] - Flow error taxonomy

pub mod authorize;
pub mod client;
pub mod config;
pub mod error;
pub mod profile;
pub mod session;
pub mod token;

pub use authorize::AuthorizationRedirect;
pub use client::CleverClient;
pub use config::{ClientCredentials, CleverConfig, ConfigError};
pub use error::{CleverError, ErrorKind, FlowStage};
pub use profile::{ProfileFetcher, UserProfile};
pub use session::{InMemorySessionStore, SessionError, SessionId, SessionStore, UserSession};
pub use token::{AccessToken, TokenExchanger};

/// Type alias for sign-in flow results.
pub type CleverResult<T> = Result<T, CleverError>;
