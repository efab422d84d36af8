//! crates/socratic_core/src/hash.rs
//!
//! Content-addressed identity for uploaded documents. Two byte-identical
//! uploads map to the same digest regardless of filename or metadata; this
//! digest is the sole dedup key for a session.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Chunk size used when feeding content through the hasher, so large
/// uploads never need to be resident in one contiguous pass.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// A stable, collision-resistant identifier for document content:
/// the lowercase hex SHA-256 of the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> String {
        digest.0
    }
}

/// Rehydrates a digest persisted as its hex string. Only stores should
/// need this; fresh digests come from the hasher.
impl From<String> for ContentDigest {
    fn from(hex: String) -> Self {
        ContentDigest(hex)
    }
}

/// Incremental content hasher. Feed chunks as they arrive, then `finish`.
#[derive(Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    pub fn finish(self) -> ContentDigest {
        use fmt::Write;
        let bytes = self.inner.finalize();
        let mut hex = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            let _ = write!(hex, "{b:02x}");
        }
        ContentDigest(hex)
    }
}

/// Digests content already held in memory, chunked through the
/// incremental hasher.
pub fn digest_bytes(content: &[u8]) -> ContentDigest {
    let mut hasher = ContentHasher::new();
    for chunk in content.chunks(HASH_CHUNK_SIZE) {
        hasher.update(chunk);
    }
    hasher.finish()
}

/// Digests content streamed from a reader with a fixed-size buffer,
/// bounding peak memory for large uploads.
pub async fn digest_reader<R>(mut reader: R) -> std::io::Result<ContentDigest>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = ContentHasher::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA-256("abc"), a published test vector.
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn digest_matches_known_vector() {
        assert_eq!(digest_bytes(b"abc").as_str(), ABC_SHA256);
    }

    #[test]
    fn identical_content_yields_identical_digest() {
        let a = digest_bytes(b"the same bytes");
        let b = digest_bytes(b"the same bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_yields_different_digest() {
        assert_ne!(digest_bytes(b"one"), digest_bytes(b"two"));
    }

    #[test]
    fn incremental_hashing_matches_one_shot() {
        let mut hasher = ContentHasher::new();
        hasher.update(b"a");
        hasher.update(b"bc");
        assert_eq!(hasher.finish().as_str(), ABC_SHA256);
    }

    #[tokio::test]
    async fn reader_hashing_matches_one_shot() {
        let content = vec![7u8; 3 * HASH_CHUNK_SIZE + 11];
        let streamed = digest_reader(content.as_slice()).await.unwrap();
        assert_eq!(streamed, digest_bytes(&content));
    }
}
