//! crates/socratic_core/src/domain.rs
//!
//! Defines the pure, core data structures for Socratic sessions.
//! These structs are independent of any database or HTTP layer; they are
//! `serde`-enabled only because the message log is persisted as JSON.

use crate::hash::ContentDigest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message in the transcript.
///
/// The data model deliberately does NOT enforce user/assistant alternation:
/// a session may carry two assistant messages in a row (e.g. an "added your
/// document" notice followed by a document summary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in a session's append-only transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A persistent, owner-scoped container pairing an accumulating set of
/// ingested documents with an append-only chat transcript.
///
/// `content_digests` and `display_names` are parallel by insertion order:
/// index `i` of `display_names` names the i-th unique digest added. Digests
/// are never removed except by whole-session deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content_digests: Vec<ContentDigest>,
    pub display_names: Vec<String>,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency token, bumped by the store on every write.
    pub version: i64,
}

impl Session {
    /// Creates a fresh session seeded with its first document and the
    /// acknowledgement message the user sees immediately after upload.
    pub fn new(owner_id: Uuid, digest: ContentDigest, display_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            content_digests: vec![digest],
            display_names: vec![display_name.to_string()],
            messages: vec![ChatMessage::new(
                Role::Assistant,
                format!("I'm ready to discuss **{display_name}** with you."),
            )],
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Dedup check: is this content already part of the session?
    pub fn contains_digest(&self, digest: &ContentDigest) -> bool {
        self.content_digests.contains(digest)
    }

    /// Records a newly ingested document, keeping the digest/display-name
    /// pairing intact. Callers must check `contains_digest` first; a
    /// duplicate digest is silently ignored here to preserve uniqueness.
    pub fn record_document(&mut self, digest: ContentDigest, display_name: &str) {
        if self.contains_digest(&digest) {
            return;
        }
        self.content_digests.push(digest);
        self.display_names.push(display_name.to_string());
        self.touch();
    }

    /// Appends to the transcript. Messages are never edited or removed.
    pub fn push_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
        self.touch();
    }

    /// `updated_at` is monotonically non-decreasing across mutations.
    fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn overview(&self) -> SessionOverview {
        SessionOverview {
            id: self.id,
            label: session_label(&self.display_names),
            display_names: self.display_names.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// The listing projection: enough to render a session picker without
/// shipping the whole transcript.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub id: Uuid,
    pub label: String,
    pub display_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derives the human-facing label for a session from its ordered document
/// names: the first document's name, with a count when more follow.
pub fn session_label(display_names: &[String]) -> String {
    match display_names {
        [] => "Untitled Session".to_string(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{first} + {} more", rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::digest_bytes;

    #[test]
    fn label_for_empty_list_is_untitled() {
        assert_eq!(session_label(&[]), "Untitled Session");
    }

    #[test]
    fn label_for_single_document_is_its_name() {
        let names = vec!["notes.pdf".to_string()];
        assert_eq!(session_label(&names), "notes.pdf");
    }

    #[test]
    fn label_for_many_documents_counts_the_rest() {
        let names = vec![
            "notes.pdf".to_string(),
            "slides.pdf".to_string(),
            "paper.pdf".to_string(),
        ];
        assert_eq!(session_label(&names), "notes.pdf + 2 more");
    }

    #[test]
    fn record_document_keeps_digest_name_pairing() {
        let mut session = Session::new(Uuid::new_v4(), digest_bytes(b"one"), "one.txt");
        session.record_document(digest_bytes(b"two"), "two.txt");
        session.record_document(digest_bytes(b"one"), "one-again.txt");

        assert_eq!(session.content_digests.len(), session.display_names.len());
        assert_eq!(session.display_names, vec!["one.txt", "two.txt"]);
    }

    #[test]
    fn new_session_seeds_acknowledgement_message() {
        let session = Session::new(Uuid::new_v4(), digest_bytes(b"doc"), "doc.md");
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::Assistant);
        assert!(session.messages[0].content.contains("doc.md"));
    }

    #[test]
    fn message_json_shape_matches_the_persisted_contract() {
        let message = ChatMessage::new(Role::Assistant, "hello");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "hello");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn push_message_never_decreases_updated_at() {
        let mut session = Session::new(Uuid::new_v4(), digest_bytes(b"doc"), "doc.md");
        let before = session.updated_at;
        session.push_message(Role::User, "hello");
        assert!(session.updated_at >= before);
        assert_eq!(session.messages.len(), 2);
    }
}
