//! Unified API router for SecondBrain
//!
//! Merges the module routers into a single axum `Router` with CORS and
//! request tracing.
//!
//! ## Endpoint Map
//!
//! | Prefix                     | Module | Description                   |
//! |----------------------------|--------|-------------------------------|
//! | `/health`                  | api    | Health probe                  |
//! | `/functions/v1/ai-process` | ai     | Enrichment proxy              |
//! | `/functions/v1/ai-chat`    | ai     | Chat proxy                    |
//! | `/api/v1/items/*`          | store  | Local items API               |

use crate::ai::{ai_router, AiState};
use crate::error::Error;
use crate::store::{items_router, ItemsState};
use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Error payload shared by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Render an error as `(status, {error})`
pub fn error_response(status: u16, err: &Error) -> (StatusCode, Json<ErrorBody>) {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

/// Build the complete SecondBrain HTTP application
pub fn build_app(items_state: ItemsState, ai_state: AiState, cors_origins: &[String]) -> Router {
    let cors = build_cors(cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .merge(ai_router(ai_state))
        .merge(items_router(items_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}
