//! crates/socratic_core/src/manager.rs
//!
//! The session manager: orchestrates session lifecycle, content dedup,
//! transcript ordering, and the protocol with the external inference
//! service. This is the component the (external) HTTP layer calls into.

use crate::domain::{Role, Session, SessionOverview};
use crate::hash::digest_bytes;
use crate::ports::{InferenceGateway, SessionError, SessionResult, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// How many times a versioned write is retried after losing to a
/// concurrent writer before the failure surfaces as `Persistence`.
const MAX_WRITE_ATTEMPTS: u32 = 4;

/// What an upload produced: the session to continue in, and whether the
/// content was already known (so the caller can render a lighter
/// confirmation and knows no ingest happened).
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub session_id: Uuid,
    pub was_duplicate: bool,
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn InferenceGateway>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, gateway: Arc<dyn InferenceGateway>) -> Self {
        Self { store, gateway }
    }

    /// Creates a session from a first upload, or appends an upload to an
    /// existing session.
    ///
    /// The digest, display name, and acknowledgement message are persisted
    /// BEFORE the ingest call, so a failure downstream can never cause the
    /// same content to be ingested twice: on retry the dedup check sees the
    /// recorded digest. The cost is that an ingest failure leaves content
    /// recorded but unindexed; the surfaced error tells the caller the
    /// upload did not fully complete.
    pub async fn upload_document(
        &self,
        owner_id: Uuid,
        session_id: Option<Uuid>,
        content: &[u8],
        display_name: &str,
    ) -> SessionResult<UploadOutcome> {
        if content.is_empty() {
            return Err(SessionError::Validation("no file content".into()));
        }
        let digest = digest_bytes(content);

        let (session, was_duplicate) = match session_id {
            None => {
                let session = Session::new(owner_id, digest.clone(), display_name);
                self.store.insert(&session).await?;
                info!(session_id = %session.id, document = display_name, "created session");
                (session, false)
            }
            Some(id) => {
                let (session, was_duplicate) = self
                    .mutate_session(id, owner_id, |session| {
                        if session.contains_digest(&digest) {
                            session.push_message(
                                Role::Assistant,
                                format!("I already have **{display_name}** in my context."),
                            );
                            true
                        } else {
                            session.record_document(digest.clone(), display_name);
                            session.push_message(
                                Role::Assistant,
                                format!("I've added **{display_name}** to our context. Ask away!"),
                            );
                            false
                        }
                    })
                    .await?;
                (session, was_duplicate)
            }
        };

        if was_duplicate {
            return Ok(UploadOutcome {
                session_id: session.id,
                was_duplicate: true,
            });
        }

        let outcome = self
            .gateway
            .ingest(content, &digest, display_name)
            .await
            .map_err(|e| {
                warn!(session_id = %session.id, error = %e, "ingest call failed");
                e
            })?;

        if let Some(summary) = outcome.summary {
            self.mutate_session(session.id, owner_id, |session| {
                session.push_message(Role::Assistant, format!("### Document Review\n{summary}"));
            })
            .await?;
        }

        Ok(UploadOutcome {
            session_id: session.id,
            was_duplicate: false,
        })
    }

    /// Records one chat turn: persists the user message, asks the inference
    /// service for a reply grounded in the full transcript and every
    /// document the session has accumulated, persists the reply.
    ///
    /// The user message is saved before the gateway call, so it is never
    /// lost to a downstream failure. On gateway failure no synthetic
    /// assistant text is appended; the typed error is the caller's to
    /// render, and the transcript keeps only real exchanges.
    pub async fn send_chat_message(
        &self,
        owner_id: Uuid,
        session_id: Uuid,
        text: &str,
    ) -> SessionResult<String> {
        if text.trim().is_empty() {
            return Err(SessionError::Validation("no message text".into()));
        }

        let (session, _) = self
            .mutate_session(session_id, owner_id, |session| {
                session.push_message(Role::User, text);
            })
            .await?;

        let reply = self
            .gateway
            .chat(text, &session.messages, &session.content_digests)
            .await
            .map_err(|e| {
                warn!(session_id = %session_id, error = %e, "chat call failed");
                e
            })?;

        self.mutate_session(session_id, owner_id, |session| {
            session.push_message(Role::Assistant, reply.clone());
        })
        .await?;

        Ok(reply)
    }

    /// All of the owner's sessions, most recently updated first.
    pub async fn list_sessions(&self, owner_id: Uuid) -> SessionResult<Vec<SessionOverview>> {
        let sessions = self.store.list_for_owner(owner_id).await?;
        Ok(sessions.iter().map(Session::overview).collect())
    }

    /// One session with its full transcript. Wrong owner reads as `NotFound`.
    pub async fn get_session(&self, owner_id: Uuid, session_id: Uuid) -> SessionResult<Session> {
        self.store.fetch(session_id, owner_id).await
    }

    /// Hard delete. The id+owner match IS the ownership check: a delete
    /// aimed at another user's session reports `NotFound`, never anything
    /// that would confirm the session exists.
    pub async fn delete_session(&self, owner_id: Uuid, session_id: Uuid) -> SessionResult<()> {
        self.store.delete(session_id, owner_id).await?;
        info!(session_id = %session_id, "deleted session");
        Ok(())
    }

    /// One logical append as a load/mutate/versioned-write transaction.
    ///
    /// On a version conflict the session is reloaded and the mutation
    /// reapplied against fresh state, so concurrent appends to the same
    /// session interleave instead of clobbering each other. The closure
    /// must therefore be safe to run more than once.
    async fn mutate_session<F, T>(
        &self,
        session_id: Uuid,
        owner_id: Uuid,
        mut apply: F,
    ) -> SessionResult<(Session, T)>
    where
        F: FnMut(&mut Session) -> T + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut session = self.store.fetch(session_id, owner_id).await?;
            let expected = session.version;
            let value = apply(&mut session);
            match self.store.update(&session, expected).await {
                Ok(()) => {
                    session.version = expected + 1;
                    return Ok((session, value));
                }
                Err(SessionError::WriteConflict) => {
                    warn!(
                        session_id = %session_id,
                        attempt,
                        "lost versioned write, reloading session"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Err(SessionError::Persistence(format!(
            "gave up after {MAX_WRITE_ATTEMPTS} conflicting writes to session {session_id}"
        )))
    }
}
