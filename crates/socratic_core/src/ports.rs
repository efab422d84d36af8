//! crates/socratic_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the session core.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete database and inference service.

use crate::domain::{ChatMessage, Session};
use crate::hash::ContentDigest;
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Error and Result Types
//=========================================================================================

/// The error taxonomy for every session operation.
///
/// `NotFound` covers both a missing session id and a session owned by a
/// different user; merging the two keeps session existence from leaking
/// across owners.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Inference service timed out")]
    GatewayTimeout,
    #[error("Inference service error: {0}")]
    GatewayError(String),
    #[error("Inference service returned a malformed response: {0}")]
    GatewayMalformed(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
    /// A compare-and-swap write lost to a concurrent writer. The session
    /// manager retries these a bounded number of times; callers only see
    /// this variant if the store is used directly.
    #[error("Conflicting concurrent write to session")]
    WriteConflict,
}

/// A convenience type alias for `Result<T, SessionError>`.
pub type SessionResult<T> = Result<T, SessionError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence contract for session records.
///
/// Writes are versioned: `update` succeeds only when `expected_version`
/// still matches the stored record, and bumps the version on success. A
/// blind whole-record overwrite is deliberately not part of this contract.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a brand-new session record.
    async fn insert(&self, session: &Session) -> SessionResult<()>;

    /// Loads one session. Returns `NotFound` when the id is unknown OR the
    /// session belongs to a different owner.
    async fn fetch(&self, session_id: Uuid, owner_id: Uuid) -> SessionResult<Session>;

    /// Writes back a mutated session iff the stored version still equals
    /// `expected_version`; returns `WriteConflict` otherwise.
    async fn update(&self, session: &Session, expected_version: i64) -> SessionResult<()>;

    /// All sessions for one owner, most recently updated first.
    async fn list_for_owner(&self, owner_id: Uuid) -> SessionResult<Vec<Session>>;

    /// Hard delete scoped to the owner; `NotFound` when nothing matched.
    async fn delete(&self, session_id: Uuid, owner_id: Uuid) -> SessionResult<()>;
}

/// What the external service reports back from a successful ingest.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub summary: Option<String>,
}

/// Boundary contract for the external inference/retrieval service.
///
/// Both calls are single-attempt and time-bounded by the implementation;
/// a hang must surface as `GatewayTimeout` rather than blocking forever.
/// The session manager's dedup check is what keeps `ingest` from being
/// called twice for the same content.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Submits raw document content for indexing/summarization.
    async fn ingest(
        &self,
        content: &[u8],
        digest: &ContentDigest,
        display_name: &str,
    ) -> SessionResult<IngestOutcome>;

    /// Answers the latest user query, grounded in every document the
    /// session has accumulated and the full ordered transcript.
    async fn chat(
        &self,
        query: &str,
        history: &[ChatMessage],
        digests: &[ContentDigest],
    ) -> SessionResult<String>;
}
