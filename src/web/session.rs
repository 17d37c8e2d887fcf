//! In-memory login sessions
//!
//! A session maps an opaque id, carried in the `sid` cookie, to the name the
//! user logged in with. Nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sid";

/// Sessions older than this are treated as logged out
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Most sessions held at once; the oldest is evicted to make room
pub const MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone)]
struct Session {
    username: String,
    created: Instant,
}

/// Session id to username map, bounded by age and count
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(SESSION_TTL, MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a custom lifetime and size cap
    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Start a session for `username` and return its id
    pub async fn create(&self, username: &str) -> String {
        self.create_replacing(None, username).await
    }

    /// Start a session for `username`, ending `previous` if it is still live
    pub async fn create_replacing(&self, previous: Option<&str>, username: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;

        if let Some(previous) = previous {
            sessions.remove(previous);
        }

        let ttl = self.ttl;
        sessions.retain(|_, session| session.created.elapsed() < ttl);

        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.created)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                    tracing::debug!("Evicted oldest session");
                }
                None => break,
            }
        }

        sessions.insert(
            id.clone(),
            Session {
                username: username.to_string(),
                created: Instant::now(),
            },
        );
        tracing::debug!(username, sessions = sessions.len(), "Session created");
        id
    }

    /// Username behind a live session id
    pub async fn get(&self, id: &str) -> Option<String> {
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|session| session.created.elapsed() < self.ttl)
            .map(|session| session.username.clone())
    }

    /// Drop a session, returning the username it belonged to
    pub async fn remove(&self, id: &str) -> Option<String> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|session| session.username)
    }

    /// Username for the session cookie in `headers`, if any
    pub async fn current_user(&self, headers: &HeaderMap) -> Option<String> {
        let id = session_id(headers)?;
        self.get(&id).await
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Session id from the request's `Cookie` headers
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that stores a session id
pub fn set_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that expires the session cookie
pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
