//! Login sessions
//!
//! Plaintext demo credentials and an in-memory session table. Each session
//! owns its dialogue state behind its own lock, so turns from one session are
//! handled one at a time while other sessions proceed independently.

use crate::dialogue::DialogueState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::info;
use uuid::Uuid;

pub const ADMIN_USER: &str = "admin";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

pub struct UserDirectory {
    credentials: HashMap<String, String>,
}

impl UserDirectory {
    pub fn new<I, U, P>(credentials: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            credentials: credentials
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }

    pub fn demo() -> Self {
        Self::new([("yesh", "srt123"), ("reddy", "bank123"), (ADMIN_USER, "admin123")])
    }

    /// Check a username/password pair. Both are trimmed first.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Role> {
        let username = username.trim();
        match self.credentials.get(username) {
            Some(expected) if expected == password.trim() => Some(if username == ADMIN_USER {
                Role::Admin
            } else {
                Role::Customer
            }),
            _ => None,
        }
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::demo()
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    dialogue: Mutex<DialogueState>,
}

impl Session {
    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Lock this session's dialogue state for the duration of a turn
    pub async fn dialogue(&self) -> MutexGuard<'_, DialogueState> {
        self.dialogue.lock().await
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, username: &str, role: Role) -> Arc<Session> {
        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role,
            created_at: Utc::now(),
            dialogue: Mutex::new(DialogueState::Idle),
        });

        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());

        info!(session_id = %session.id, %username, ?role, "Session created");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<Session>> {
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_some() {
            info!(session_id = %id, "Session closed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
