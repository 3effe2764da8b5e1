//! Process-local session store.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use super::{SessionError, SessionId, SessionStore, UserSession};

/// Default idle lifetime of a session (24 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 3600);

/// Longest accepted idle lifetime (one year).
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

#[derive(Debug, Clone)]
struct StoredSession {
    session: UserSession,
    expires_at: OffsetDateTime,
}

/// In-memory session store with idle expiry.
///
/// Every successful load pushes the expiry forward by the TTL. Expired
/// entries are dropped when they are next looked up and swept on each save.
#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, StoredSession>,
    ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl InMemorySessionStore {
    /// Creates an empty store with the given idle TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Returns the number of stored sessions, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        // Counted inside retain: concurrent saves change len() meanwhile
        let mut purged = 0;
        self.sessions.retain(|_, stored| {
            let keep = stored.expires_at > now;
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }

    fn expiry_from(&self, now: OffsetDateTime) -> Result<OffsetDateTime, SessionError> {
        time::Duration::try_from(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| {
                SessionError::Storage(format!("session ttl {:?} is out of range", self.ttl))
            })
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<UserSession>, SessionError> {
        let now = OffsetDateTime::now_utc();

        if let Some(mut stored) = self.sessions.get_mut(id) {
            if stored.expires_at > now {
                stored.expires_at = self.expiry_from(now)?;
                return Ok(Some(stored.session.clone()));
            }
        } else {
            return Ok(None);
        }

        // Expired; the guard above is released before removal.
        self.sessions.remove(id);
        tracing::debug!(session_id = %id, "Session expired");
        Ok(None)
    }

    async fn save(&self, id: &SessionId, session: UserSession) -> Result<(), SessionError> {
        let purged = self.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired sessions");
        }

        let expires_at = self.expiry_from(OffsetDateTime::now_utc())?;
        self.sessions.insert(
            *id,
            StoredSession {
                session,
                expires_at,
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions.remove(id);
        Ok(())
    }
}
