//! Request-scoped session handle.
//!
//! The session id travels in a cookie signed with a key derived from the
//! configured app secret. Session contents live in the [`SessionStore`].
//! A missing, tampered or unknown cookie yields an anonymous session.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::Key;
use clever_auth::{CleverError, SessionId, SessionStore, UserSession};
use cookie::{Cookie, SameSite};
use sha2::{Digest, Sha512};

use crate::error::AppError;
use crate::server::AppState;

/// Derives the cookie signing key from the app secret.
///
/// SHA-512 yields exactly the 64 bytes `Key::from` expects, for any secret length.
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Session cookie attributes.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub max_age: Duration,
}

impl SessionCookie {
    fn build(&self, id: &SessionId) -> Cookie<'static> {
        let secs = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        let max_age = time::Duration::seconds(secs);

        Cookie::build((self.name.clone(), id.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .build()
    }
}

/// The current browser session, injected into handlers.
pub struct SessionHandle {
    jar: SignedCookieJar,
    store: Arc<dyn SessionStore>,
    cookie: Arc<SessionCookie>,
    id: Option<SessionId>,
    current: Option<UserSession>,
}

impl SessionHandle {
    /// Returns the signed-in Clever user id, if any.
    pub fn user(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.user.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some_and(|u| !u.is_empty())
    }

    /// Returns the authenticated session or `Unauthenticated`.
    pub fn require(&self) -> Result<&UserSession, CleverError> {
        self.current
            .as_ref()
            .filter(|s| !s.user.is_empty())
            .ok_or(CleverError::Unauthenticated)
    }

    /// Stores `session` under a fresh id and returns the jar carrying the new cookie.
    ///
    /// Any previous session for this browser is discarded.
    pub async fn set(self, session: UserSession) -> Result<SignedCookieJar, CleverError> {
        if let Some(old) = self.id {
            self.store.remove(&old).await?;
        }

        let id = SessionId::generate();
        let user = session.user.clone();
        self.store.save(&id, session).await?;

        tracing::debug!(user_id = %user, "Session created");
        Ok(self.jar.add(self.cookie.build(&id)))
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let jar = SignedCookieJar::from_headers(&parts.headers, app.cookie_key.clone());

        let id = jar
            .get(&app.session_cookie.name)
            .and_then(|c| c.value().parse::<SessionId>().ok());

        let current = match &id {
            Some(id) => app.sessions.load(id).await?,
            None => None,
        };

        Ok(Self {
            jar,
            store: app.sessions,
            cookie: app.session_cookie,
            id,
            current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_key_is_deterministic() {
        let a = signing_key("app-secret");
        let b = signing_key("app-secret");
        let c = signing_key("other-secret");
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }

    #[test]
    fn short_secret_still_yields_key() {
        assert_eq!(signing_key("x").master().len(), 64);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = SessionCookie {
            name: "clever_session".into(),
            secure: true,
            max_age: Duration::from_secs(3600),
        };
        let id = SessionId::generate();
        let built = cookie.build(&id);

        assert_eq!(built.name(), "clever_session");
        assert_eq!(built.value(), id.to_string());
        assert_eq!(built.http_only(), Some(true));
        assert_eq!(built.secure(), Some(true));
        assert_eq!(built.same_site(), Some(SameSite::Lax));
        assert_eq!(built.path(), Some("/"));
        assert_eq!(built.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[test]
    fn oversized_max_age_saturates() {
        let cookie = SessionCookie {
            name: "clever_session".into(),
            secure: false,
            max_age: Duration::MAX,
        };
        let built = cookie.build(&SessionId::generate());
        assert_eq!(built.max_age(), Some(time::Duration::seconds(i64::MAX)));
    }
}
