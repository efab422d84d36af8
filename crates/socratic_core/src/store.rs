//! crates/socratic_core/src/store.rs
//!
//! In-memory implementation of the `SessionStore` port. Backs local
//! development and the core test suite; production runs the Postgres
//! adapter in the api service against the same contract.

use crate::domain::Session;
use crate::ports::{SessionError, SessionResult, SessionStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: &Session) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(SessionError::Persistence(format!(
                "session {} already exists",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn fetch(&self, session_id: Uuid, owner_id: Uuid) -> SessionResult<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&session_id)
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .ok_or(SessionError::NotFound)
    }

    async fn update(&self, session: &Session, expected_version: i64) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(&session.id).ok_or(SessionError::NotFound)?;
        if stored.version != expected_version {
            return Err(SessionError::WriteConflict);
        }
        let mut next = session.clone();
        next.version = expected_version + 1;
        *stored = next;
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> SessionResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut owned: Vec<Session> = sessions
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn delete(&self, session_id: Uuid, owner_id: Uuid) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&session_id) {
            Some(s) if s.owner_id == owner_id => {
                sessions.remove(&session_id);
                Ok(())
            }
            _ => Err(SessionError::NotFound),
        }
    }
}
