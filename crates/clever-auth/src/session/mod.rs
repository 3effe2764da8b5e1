//! User session model and storage.
//!
//! A session is created once the token exchange and the profile fetch have
//! both succeeded, and holds the user id under `user` and the full profile
//! under `data`. Sessions are keyed by an opaque [`SessionId`] carried in a
//! signed cookie.
//!
//! # Implementation Notes
//!
//! Store implementations should:
//!
//! - Treat expired sessions as absent
//! - Never log session contents (profiles are personal data)

mod memory;

pub use memory::{DEFAULT_SESSION_TTL, InMemorySessionStore, MAX_SESSION_TTL};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::profile::UserProfile;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// An authenticated user's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    /// Clever user id.
    pub user: String,

    /// Full Clever profile (`/me` `data` object).
    pub data: Map<String, Value>,
}

impl From<UserProfile> for UserSession {
    fn from(profile: UserProfile) -> Self {
        Self {
            user: profile.id,
            data: profile.data,
        }
    }
}

/// Session store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The backing store failed.
    #[error("Session storage error: {0}")]
    Storage(String),
}

/// Storage for user sessions.
///
/// # Implementations
///
/// - [`InMemorySessionStore`] (process-local, for single-instance deployments)
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session, returning `None` when it does not exist or has expired.
    async fn load(&self, id: &SessionId) -> Result<Option<UserSession>, SessionError>;

    /// Creates or replaces a session.
    async fn save(&self, id: &SessionId, session: UserSession) -> Result<(), SessionError>;

    /// Removes a session. Removing an unknown id is not an error.
    async fn remove(&self, id: &SessionId) -> Result<(), SessionError>;
}
