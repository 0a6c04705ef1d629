//! HTTP handlers for the AI proxy functions
//!
//! - POST /functions/v1/ai-process: summary + tags for one item
//! - POST /functions/v1/ai-chat:    one assistant reply for a transcript
//!
//! Failures answer `{error}` with 429/402 for the gateway quota
//! conditions and 500 for everything else, including malformed bodies.

use super::chat::ChatResponder;
use super::enrich::Enricher;
use super::types::{ChatReply, ChatRequest, EnrichRequest};
use crate::api::error_response;
use crate::error::{Error, Result};
use crate::store::bearer_token;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the proxy handlers
#[derive(Clone)]
pub struct AiState {
    pub enricher: Arc<Enricher>,
    pub chat: Arc<ChatResponder>,
}

/// Create the AI proxy router
pub fn ai_router(state: AiState) -> Router {
    Router::new()
        .route("/functions/v1/ai-process", post(ai_process))
        .route("/functions/v1/ai-chat", post(ai_chat))
        .with_state(state)
}

fn proxy_reply<T: Serialize>(function: &str, result: Result<T>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            tracing::error!("{} error: {}", function, err);
            error_response(err.proxy_status(), &err).into_response()
        }
    }
}

/// POST /functions/v1/ai-process
async fn ai_process(State(state): State<AiState>, body: Bytes) -> Response {
    let result = async {
        let request: EnrichRequest = serde_json::from_slice(&body)?;
        state.enricher.enrich(&request).await
    }
    .await;
    proxy_reply("ai-process", result)
}

/// POST /functions/v1/ai-chat
async fn ai_chat(State(state): State<AiState>, headers: HeaderMap, body: Bytes) -> Response {
    let result = async {
        let request: ChatRequest = serde_json::from_slice(&body)?;
        let content = state
            .chat
            .respond(bearer_token(&headers), request.messages)
            .await?;
        Ok::<_, Error>(ChatReply { content })
    }
    .await;
    proxy_reply("ai-chat", result)
}
