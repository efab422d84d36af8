//! Exercises `HttpInferenceGateway` against a throwaway local server, so
//! the wire format and each failure classification are covered without a
//! real inference service.

use api_lib::adapters::HttpInferenceGateway;
use axum::{
    extract::Multipart,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use socratic_core::{digest_bytes, ChatMessage, InferenceGateway, Role, SessionError};
use std::time::Duration;

/// Binds a router on an ephemeral port and returns its base URL.
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn gateway_for(base_url: String) -> HttpInferenceGateway {
    HttpInferenceGateway::new(base_url, Duration::from_secs(5)).unwrap()
}

fn history() -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(Role::Assistant, "I'm ready to discuss **notes.pdf** with you."),
        ChatMessage::new(Role::User, "What is the main idea?"),
    ]
}

#[tokio::test]
async fn chat_sends_query_hashes_and_history() {
    // echo back what arrived so the test can assert on the payload
    let router = Router::new().route(
        "/chat",
        post(|Json(body): Json<serde_json::Value>| async move {
            let n_hashes = body["file_hashes"].as_array().unwrap().len();
            let n_history = body["history"].as_array().unwrap().len();
            let query = body["query"].as_str().unwrap().to_string();
            Json(serde_json::json!({
                "response": format!("{query}|{n_hashes}|{n_history}")
            }))
        }),
    );
    let gateway = gateway_for(spawn_server(router).await);

    let digests = vec![digest_bytes(b"a"), digest_bytes(b"b")];
    let reply = gateway
        .chat("What is the main idea?", &history(), &digests)
        .await
        .unwrap();
    assert_eq!(reply, "What is the main idea?|2|2");
}

#[tokio::test]
async fn chat_error_status_carries_the_service_message() {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "model exploded" })),
            )
        }),
    );
    let gateway = gateway_for(spawn_server(router).await);

    let err = gateway.chat("hi", &history(), &[]).await.unwrap_err();
    match err {
        SessionError::GatewayError(msg) => assert!(msg.contains("model exploded")),
        other => panic!("expected GatewayError, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_with_wrong_shape_is_malformed() {
    let router = Router::new().route(
        "/chat",
        post(|| async { Json(serde_json::json!({ "unexpected": true })) }),
    );
    let gateway = gateway_for(spawn_server(router).await);

    let err = gateway.chat("hi", &history(), &[]).await.unwrap_err();
    assert!(matches!(err, SessionError::GatewayMalformed(_)));
}

#[tokio::test]
async fn hanging_chat_times_out() {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(serde_json::json!({ "response": "too late" }))
        }),
    );
    let base_url = spawn_server(router).await;
    let gateway = HttpInferenceGateway::new(base_url, Duration::from_millis(200)).unwrap();

    let err = gateway.chat("hi", &history(), &[]).await.unwrap_err();
    assert!(matches!(err, SessionError::GatewayTimeout));
}

#[tokio::test]
async fn stalled_response_body_is_a_timeout_not_malformed() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // A raw socket server: sends a 200 status line and headers promising a
    // body, then never delivers the rest of it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\n\
                          content-type: application/json\r\n\
                          content-length: 100\r\n\r\n\
                          {\"respo",
                    )
                    .await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    let gateway =
        HttpInferenceGateway::new(format!("http://{addr}"), Duration::from_millis(300)).unwrap();
    let err = gateway.chat("hi", &history(), &[]).await.unwrap_err();
    assert!(matches!(err, SessionError::GatewayTimeout));
}

async fn ingest_echo(mut multipart: Multipart) -> impl IntoResponse {
    let mut file_name = String::new();
    let mut file_hash = String::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().unwrap_or_default().to_string();
                let _ = field.bytes().await.unwrap();
            }
            Some("file_hash") => file_hash = field.text().await.unwrap(),
            _ => {}
        }
    }
    Json(serde_json::json!({ "summary": format!("{file_name}:{file_hash}") }))
}

#[tokio::test]
async fn ingest_posts_file_and_hash_as_multipart() {
    let router = Router::new().route("/ingest", post(ingest_echo));
    let gateway = gateway_for(spawn_server(router).await);

    let digest = digest_bytes(b"notes content");
    let outcome = gateway
        .ingest(b"notes content", &digest, "notes.pdf")
        .await
        .unwrap();
    assert_eq!(
        outcome.summary.unwrap(),
        format!("notes.pdf:{}", digest.as_str())
    );
}

#[tokio::test]
async fn ingest_without_summary_is_still_a_success() {
    let router = Router::new().route(
        "/ingest",
        post(|_multipart: Multipart| async { Json(serde_json::json!({})) }),
    );
    let gateway = gateway_for(spawn_server(router).await);

    let digest = digest_bytes(b"doc");
    let outcome = gateway.ingest(b"doc", &digest, "doc.txt").await.unwrap();
    assert!(outcome.summary.is_none());
}
