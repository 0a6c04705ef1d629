//! HTTP handlers for the local items API
//!
//! Provides 4 REST endpoints, all bearer-authenticated and scoped to the
//! caller:
//! - GET    /api/v1/items      list items (optional q/type/favorites/sort)
//! - POST   /api/v1/items      create item
//! - PATCH  /api/v1/items/:id  partial update
//! - DELETE /api/v1/items/:id  delete (idempotent)

use crate::api::{error_response, ErrorBody};
use crate::error::{Error, Result};
use crate::knowledge::{self, ItemPatch, ItemQuery, NewItem};
use crate::store::{bearer_token, Authenticator, KnowledgeStore, Session};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for item handlers
#[derive(Clone)]
pub struct ItemsState {
    pub store: Arc<dyn KnowledgeStore>,
    pub auth: Arc<dyn Authenticator>,
}

/// Create the items router
pub fn items_router(state: ItemsState) -> Router {
    Router::new()
        .route("/api/v1/items", get(list_items).post(create_item))
        .route("/api/v1/items/:id", patch(update_item).delete(delete_item))
        .with_state(state)
}

// =============================================================================
// Query parameter types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct ListItemsQuery {
    q: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
    favorites: Option<bool>,
    sort: Option<String>,
}

impl ListItemsQuery {
    fn into_item_query(self) -> Result<ItemQuery> {
        let mut query = ItemQuery::new()
            .search(self.q.unwrap_or_default())
            .favorites_only(self.favorites.unwrap_or(false));
        if let Some(t) = self.item_type {
            query = query.item_type(t.parse().map_err(Error::Validation)?);
        }
        if let Some(s) = self.sort {
            query = query.sort(s.parse().map_err(Error::Validation)?);
        }
        Ok(query)
    }
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    deleted: u64,
}

// =============================================================================
// Handlers
// =============================================================================

async fn session_from(state: &ItemsState, headers: &HeaderMap) -> Result<Session> {
    let token = bearer_token(headers)
        .ok_or_else(|| Error::Auth("Missing bearer token".to_string()))?;
    match state.auth.resolve(token).await? {
        Some(user_id) => Ok(Session::new(user_id, token)),
        None => Err(Error::Auth("Invalid or expired token".to_string())),
    }
}

fn reply<T: Serialize>(status: StatusCode, result: Result<T>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => {
            let (status, body): (StatusCode, Json<ErrorBody>) =
                error_response(err.api_status(), &err);
            (status, body).into_response()
        }
    }
}

/// GET /api/v1/items
async fn list_items(
    State(state): State<ItemsState>,
    headers: HeaderMap,
    Query(params): Query<ListItemsQuery>,
) -> Response {
    let result = async {
        let query = params.into_item_query()?;
        let session = session_from(&state, &headers).await?;
        let items = state.store.list(&session).await?;
        Ok::<_, Error>(knowledge::apply(&items, &query))
    }
    .await;
    reply(StatusCode::OK, result)
}

/// POST /api/v1/items
async fn create_item(
    State(state): State<ItemsState>,
    headers: HeaderMap,
    Json(request): Json<NewItem>,
) -> Response {
    let result = async {
        let session = session_from(&state, &headers).await?;
        state.store.insert(&session, request).await
    }
    .await;
    if let Ok(item) = &result {
        tracing::info!(item_id = %item.id, user_id = %item.user_id, "Captured knowledge item");
    }
    reply(StatusCode::CREATED, result)
}

/// PATCH /api/v1/items/:id
async fn update_item(
    State(state): State<ItemsState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<ItemPatch>,
) -> Response {
    let result = async {
        let session = session_from(&state, &headers).await?;
        state.store.update(&session, &id, patch).await
    }
    .await;
    reply(StatusCode::OK, result)
}

/// DELETE /api/v1/items/:id
async fn delete_item(
    State(state): State<ItemsState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let result = async {
        let session = session_from(&state, &headers).await?;
        let deleted = state.store.delete(&session, &id).await?;
        Ok::<_, Error>(DeleteResponse { deleted })
    }
    .await;
    reply(StatusCode::OK, result)
}
