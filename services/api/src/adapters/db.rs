//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `SessionStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Writes are guarded by a version column: `update` is a compare-and-swap
//! on `version`, so a concurrent append can never blind-overwrite another
//! writer's messages or digests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use socratic_core::domain::{ChatMessage, Session};
use socratic_core::hash::ContentDigest;
use socratic_core::ports::{SessionError, SessionResult, SessionStore};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `SessionStore` port.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Creates a new `PgSessionStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn persistence(e: sqlx::Error) -> SessionError {
    SessionError::Persistence(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    owner_id: Uuid,
    content_digests: Vec<String>,
    display_names: Vec<String>,
    messages: Json<Vec<ChatMessage>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl SessionRecord {
    fn to_domain(self) -> Session {
        Session {
            id: self.id,
            owner_id: self.owner_id,
            content_digests: self
                .content_digests
                .into_iter()
                .map(ContentDigest::from)
                .collect(),
            display_names: self.display_names,
            messages: self.messages.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        }
    }
}

fn digest_strings(session: &Session) -> Vec<String> {
    session
        .content_digests
        .iter()
        .map(|d| d.as_str().to_string())
        .collect()
}

const SELECT_COLUMNS: &str =
    "id, owner_id, content_digests, display_names, messages, created_at, updated_at, version";

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &Session) -> SessionResult<()> {
        sqlx::query(
            "INSERT INTO sessions \
             (id, owner_id, content_digests, display_names, messages, created_at, updated_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(session.id)
        .bind(session.owner_id)
        .bind(digest_strings(session))
        .bind(&session.display_names)
        .bind(Json(&session.messages))
        .bind(session.created_at)
        .bind(session.updated_at)
        .bind(session.version)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }

    async fn fetch(&self, session_id: Uuid, owner_id: Uuid) -> SessionResult<Session> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM sessions WHERE id = $1 AND owner_id = $2");
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence)?
            .ok_or(SessionError::NotFound)?;
        Ok(record.to_domain())
    }

    async fn update(&self, session: &Session, expected_version: i64) -> SessionResult<()> {
        let result = sqlx::query(
            "UPDATE sessions \
             SET content_digests = $1, display_names = $2, messages = $3, \
                 updated_at = $4, version = version + 1 \
             WHERE id = $5 AND version = $6",
        )
        .bind(digest_strings(session))
        .bind(&session.display_names)
        .bind(Json(&session.messages))
        .bind(session.updated_at)
        .bind(session.id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        // Zero rows means the version moved under us (or the session was
        // deleted); the manager's retry re-fetches and finds out which.
        if result.rows_affected() == 0 {
            return Err(SessionError::WriteConflict);
        }
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> SessionResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM sessions WHERE owner_id = $1 ORDER BY updated_at DESC"
        );
        let records = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;

        Ok(records.into_iter().map(SessionRecord::to_domain).collect())
    }

    async fn delete(&self, session_id: Uuid, owner_id: Uuid) -> SessionResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND owner_id = $2")
            .bind(session_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(SessionError::NotFound);
        }
        Ok(())
    }
}
