pub mod domain;
pub mod hash;
pub mod manager;
pub mod ports;
pub mod store;

pub use domain::{session_label, ChatMessage, Role, Session, SessionOverview};
pub use hash::{digest_bytes, digest_reader, ContentDigest, ContentHasher};
pub use manager::{SessionManager, UploadOutcome};
pub use ports::{
    InferenceGateway, IngestOutcome, SessionError, SessionResult, SessionStore,
};
pub use store::MemorySessionStore;
