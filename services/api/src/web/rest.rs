//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Authentication is an external collaborator: these handlers trust the
//! `x-user-id` header the auth layer resolved, and only enforce the
//! owner-scoping the session core requires.

use crate::error::session_error_response;
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use socratic_core::domain::{Role, Session};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        upload_handler,
        chat_handler,
        list_sessions_handler,
        get_history_handler,
        delete_history_handler,
    ),
    components(
        schemas(
            UploadResponse,
            ChatRequest,
            ChatResponseBody,
            SessionListItem,
            SessionResponse,
            MessageResponse,
            DeleteResponse,
        )
    ),
    tags(
        (name = "Socratic Sessions API", description = "Document-grounded tutoring sessions: upload, chat, list, delete.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after an upload was processed.
#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    session_id: Uuid,
    message: String,
    /// True when the uploaded content was already part of the session and
    /// no ingest happened.
    cached: bool,
}

/// One chat turn from the client.
#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    message: Option<String>,
    session_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponseBody {
    response: String,
}

/// A session as rendered in the picker list.
#[derive(Serialize, ToSchema)]
pub struct SessionListItem {
    id: Uuid,
    /// Summary label: first document's name, plus a count when more follow.
    filename: String,
    filenames: Vec<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    role: String,
    content: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// A full session with its transcript.
#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    id: Uuid,
    filenames: Vec<String>,
    messages: Vec<MessageResponse>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl SessionResponse {
    fn from_session(session: Session) -> Self {
        Self {
            id: session.id,
            filenames: session.display_names,
            messages: session
                .messages
                .into_iter()
                .map(|m| MessageResponse {
                    role: match m.role {
                        Role::User => "user".to_string(),
                        Role::Assistant => "assistant".to_string(),
                    },
                    content: m.content,
                    timestamp: m.timestamp,
                })
                .collect(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    message: String,
}

//=========================================================================================
// Shared Handler Helpers
//=========================================================================================

/// Pulls the caller's resolved user id out of the `x-user-id` header.
fn owner_id_from_headers(headers: &HeaderMap) -> Result<Uuid, (StatusCode, String)> {
    let user_id_str = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "x-user-id header is required".to_string(),
            )
        })?;

    Uuid::parse_str(user_id_str).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Invalid x-user-id format".to_string(),
        )
    })
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Upload a document into a new or existing session.
///
/// Accepts multipart/form-data with a `file` part and an optional
/// `session_id` text part; without a session id a new session is created.
#[utoipa::path(
    post,
    path = "/socratic/upload",
    request_body(content_type = "multipart/form-data", description = "The document to upload, plus an optional session_id field."),
    responses(
        (status = 200, description = "Document processed", body = UploadResponse),
        (status = 400, description = "Missing file, or bad session id / user header"),
        (status = 404, description = "Session not found for this user"),
        (status = 502, description = "Inference service failed"),
        (status = 504, description = "Inference service timed out")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn upload_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner_id = owner_id_from_headers(&headers)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut session_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or("untitled.txt").to_string();
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;
                file = Some((name, data.to_vec()));
            }
            Some("session_id") => {
                let raw = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read session_id field: {}", e),
                    )
                })?;
                if !raw.is_empty() {
                    session_id = Some(Uuid::parse_str(&raw).map_err(|_| {
                        (
                            StatusCode::BAD_REQUEST,
                            "Invalid session_id format".to_string(),
                        )
                    })?);
                }
            }
            _ => {}
        }
    }

    let (display_name, content) = file.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        )
    })?;

    let outcome = app_state
        .manager
        .upload_document(owner_id, session_id, &content, &display_name)
        .await
        .map_err(|e| {
            error!("Upload failed: {:?}", e);
            session_error_response(e)
        })?;

    Ok(Json(UploadResponse {
        session_id: outcome.session_id,
        message: "File processed".to_string(),
        cached: outcome.was_duplicate,
    }))
}

/// Send one chat message and receive the grounded assistant reply.
#[utoipa::path(
    post,
    path = "/socratic/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponseBody),
        (status = 400, description = "Missing message text or session id"),
        (status = 404, description = "Session not found for this user"),
        (status = 502, description = "Inference service failed"),
        (status = 504, description = "Inference service timed out")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner_id = owner_id_from_headers(&headers)?;

    let (Some(message), Some(session_id)) = (payload.message, payload.session_id) else {
        return Err((StatusCode::BAD_REQUEST, "Missing fields".to_string()));
    };

    let response = app_state
        .manager
        .send_chat_message(owner_id, session_id, &message)
        .await
        .map_err(|e| {
            error!("Chat failed: {:?}", e);
            session_error_response(e)
        })?;

    Ok(Json(ChatResponseBody { response }))
}

/// List the caller's sessions, most recently updated first.
#[utoipa::path(
    get,
    path = "/socratic/sessions",
    responses(
        (status = 200, description = "The caller's sessions", body = [SessionListItem]),
        (status = 400, description = "Missing or invalid user header")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner_id = owner_id_from_headers(&headers)?;

    let overviews = app_state
        .manager
        .list_sessions(owner_id)
        .await
        .map_err(|e| {
            error!("Listing sessions failed: {:?}", e);
            session_error_response(e)
        })?;

    let items: Vec<SessionListItem> = overviews
        .into_iter()
        .map(|o| SessionListItem {
            id: o.id,
            filename: o.label,
            filenames: o.display_names,
            created_at: o.created_at,
            updated_at: o.updated_at,
        })
        .collect();

    Ok(Json(items))
}

/// Fetch one session with its full transcript.
#[utoipa::path(
    get,
    path = "/socratic/history/{session_id}",
    responses(
        (status = 200, description = "The session with its transcript", body = SessionResponse),
        (status = 404, description = "Session not found for this user")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The session to fetch."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_history_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner_id = owner_id_from_headers(&headers)?;

    let session = app_state
        .manager
        .get_session(owner_id, session_id)
        .await
        .map_err(session_error_response)?;

    Ok(Json(SessionResponse::from_session(session)))
}

/// Hard-delete one session.
#[utoipa::path(
    delete,
    path = "/socratic/history/{session_id}",
    responses(
        (status = 200, description = "Session deleted", body = DeleteResponse),
        (status = 404, description = "Session not found for this user")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The session to delete."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn delete_history_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner_id = owner_id_from_headers(&headers)?;

    app_state
        .manager
        .delete_session(owner_id, session_id)
        .await
        .map_err(session_error_response)?;

    Ok(Json(DeleteResponse {
        message: "Session deleted".to_string(),
    }))
}
