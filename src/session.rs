use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "sid";

/// Per-client state, created at login and destroyed at logout or expiry.
/// Only the username crosses requests; the full user record is re-read
/// from the database when a handler needs it.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub username: String,
    pub current_score: i64,
    pub feedback: Option<String>,
    pub pending_answer: Option<String>,
    pub expires_at: OffsetDateTime,
}

impl SessionState {
    pub fn new(username: String, ttl: Duration) -> Self {
        Self {
            username,
            current_score: 0,
            feedback: None,
            pending_answer: None,
            expires_at: OffsetDateTime::now_utc() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }
}

/// The per-session mutex is the serialization point: two concurrent
/// guesses on the same session queue up instead of racing the score.
pub type SessionHandle = Arc<Mutex<SessionState>>;

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    /// Mints a fresh session. Doubles as the store's garbage pass: every
    /// login sweeps out expired entries, so abandoned sessions cannot
    /// accumulate without a background task.
    pub async fn create(&self, username: String, ttl: Duration) -> Uuid {
        let id = Uuid::new_v4();
        let state = Arc::new(Mutex::new(SessionState::new(username, ttl)));
        let mut sessions = self.inner.lock().await;
        sessions.retain(|_, handle| match handle.try_lock() {
            // entries locked by an in-flight request are live by definition
            Err(_) => true,
            Ok(session) => !session.is_expired(),
        });
        sessions.insert(id, state);
        id
    }

    /// Looks up a live session; expired entries are evicted here, so an
    /// expired cookie behaves exactly like a logged-out one.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        // clone the handle out before locking it: a session held across a
        // slow guess must not stall lookups of other sessions
        let handle = self.inner.lock().await.get(&id)?.clone();
        if handle.lock().await.is_expired() {
            self.inner.lock().await.remove(&id);
            return None;
        }
        Some(handle)
    }

    pub async fn remove(&self, id: Uuid) {
        self.inner.lock().await.remove(&id);
    }
}

pub fn session_cookie(id: Uuid, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.whole_seconds()
    )
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn session_id_from_parts(parts: &Parts) -> Option<Uuid> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.parse().ok())?
    })
}

/// Extracts the authenticated session, rejecting requests without a live
/// session cookie.
#[derive(Debug)]
pub struct CurrentSession {
    pub id: Uuid,
    pub session: SessionHandle,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = session_id_from_parts(parts).ok_or(AppError::Unauthenticated)?;
        let session = state
            .sessions
            .get(id)
            .await
            .ok_or(AppError::Unauthenticated)?;
        Ok(Self { id, session })
    }
}

/// Like `CurrentSession` but never rejects; logout uses it so a stale
/// cookie still gets a clean 204.
pub struct MaybeSessionId(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSessionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_id_from_parts(parts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let store = SessionStore::default();
        let id = store.create("alice".into(), Duration::hours(1)).await;
        let handle = store.get(id).await.expect("session should exist");
        let session = handle.lock().await;
        assert_eq!(session.username, "alice");
        assert_eq!(session.current_score, 0);
        assert!(session.feedback.is_none());
        assert!(session.pending_answer.is_none());
    }

    #[tokio::test]
    async fn expired_session_is_evicted() {
        let store = SessionStore::default();
        let id = store.create("alice".into(), Duration::seconds(-1)).await;
        assert!(store.get(id).await.is_none());
        // eviction, not just filtering: a second lookup also misses
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn create_sweeps_expired_sessions() {
        let store = SessionStore::default();
        let stale = store.create("alice".into(), Duration::seconds(-1)).await;
        let live = store.create("bob".into(), Duration::hours(1)).await;

        let sessions = store.inner.lock().await;
        assert!(!sessions.contains_key(&stale));
        assert!(sessions.contains_key(&live));
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn remove_destroys_all_session_state() {
        let store = SessionStore::default();
        let id = store.create("alice".into(), Duration::hours(1)).await;
        {
            let handle = store.get(id).await.unwrap();
            let mut session = handle.lock().await;
            session.current_score = 5;
            session.pending_answer = Some("Knight".into());
        }
        store.remove(id).await;
        assert!(store.get(id).await.is_none());
    }

    #[test]
    fn cookie_format() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id, Duration::hours(24));
        assert!(cookie.starts_with(&format!("sid={id}; ")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn parses_session_cookie_among_others() {
        let id = Uuid::new_v4();
        let req = axum::http::Request::builder()
            .header(header::COOKIE, format!("theme=dark; sid={id}; lang=en"))
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(session_id_from_parts(&parts), Some(id));
    }

    #[test]
    fn missing_or_malformed_cookie_yields_none() {
        let req = axum::http::Request::builder().body(()).unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(session_id_from_parts(&parts), None);

        let req = axum::http::Request::builder()
            .header(header::COOKIE, "sid=not-a-uuid")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(session_id_from_parts(&parts), None);
    }
}
