//! services/api/src/adapters/gateway.rs
//!
//! HTTP adapter for the `InferenceGateway` port. Talks to the external
//! Socratic inference service: `POST /ingest` as multipart (file bytes +
//! content digest) and `POST /chat` as JSON (query, digest set, ordered
//! history).
//!
//! Every call is single-attempt and bounded by the client timeout. Failure
//! kinds are kept distinct: a timeout, a remote error status, and a body
//! that doesn't match the contract each surface as their own error.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use socratic_core::domain::ChatMessage;
use socratic_core::hash::ContentDigest;
use socratic_core::ports::{InferenceGateway, IngestOutcome, SessionError, SessionResult};
use std::time::Duration;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `InferenceGateway` over the inference
/// service's HTTP API.
#[derive(Clone)]
pub struct HttpInferenceGateway {
    base_url: String,
    http: reqwest::Client,
}

impl HttpInferenceGateway {
    /// Creates a new `HttpInferenceGateway`. The timeout bounds each call
    /// end to end, including connection setup and body read.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn transport_error(e: reqwest::Error) -> SessionError {
        if e.is_timeout() {
            SessionError::GatewayTimeout
        } else {
            SessionError::GatewayError(e.to_string())
        }
    }

    /// Classifies a failure while reading or decoding a response body. The
    /// client timeout also covers the body read, so a stall after the
    /// status line is still a timeout, not a malformed response.
    fn decode_error(e: reqwest::Error) -> SessionError {
        if e.is_timeout() {
            SessionError::GatewayTimeout
        } else {
            SessionError::GatewayMalformed(e.to_string())
        }
    }

    /// Turns a non-2xx response into a `GatewayError`, preferring the
    /// `{ "error": ... }` message the service puts in failure bodies.
    async fn status_error(response: reqwest::Response) -> SessionError {
        let status = response.status();
        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body),
            Err(e) if e.is_timeout() => return SessionError::GatewayTimeout,
            Err(_) => String::new(),
        };
        SessionError::GatewayError(format!("inference service returned {status}: {message}"))
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct IngestResponse {
    summary: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

//=========================================================================================
// `InferenceGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn ingest(
        &self,
        content: &[u8],
        digest: &ContentDigest,
        display_name: &str,
    ) -> SessionResult<IngestOutcome> {
        let form = Form::new()
            .part(
                "file",
                Part::bytes(content.to_vec()).file_name(display_name.to_string()),
            )
            .text("file_hash", digest.as_str().to_string());

        let response = self
            .http
            .post(format!("{}/ingest", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let body: IngestResponse = response.json().await.map_err(Self::decode_error)?;
        Ok(IngestOutcome {
            summary: body.summary,
        })
    }

    async fn chat(
        &self,
        query: &str,
        history: &[ChatMessage],
        digests: &[ContentDigest],
    ) -> SessionResult<String> {
        let history_payload: Vec<serde_json::Value> = history
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role,
                    "content": m.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "query": query,
            "file_hashes": digests.iter().map(ContentDigest::as_str).collect::<Vec<_>>(),
            "history": history_payload,
        });

        let response = self
            .http
            .post(format!("{}/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let body: ChatResponse = response.json().await.map_err(Self::decode_error)?;
        Ok(body.response)
    }
}
