//! Hosted backend client (PostgREST dialect)
//!
//! ```text
//! list    GET    /rest/v1/<table>?select=*&order=created_at.desc
//! insert  POST   /rest/v1/<table>                 Prefer: return=representation
//! update  PATCH  /rest/v1/<table>?id=eq.<id>      Prefer: return=representation
//! delete  DELETE /rest/v1/<table>?id=eq.<id>      Prefer: return=representation
//! ```
//!
//! Row-level authorization on the hosted side scopes every user request to
//! the caller; the service key is only used for chat context reads, which
//! filter on `user_id` explicitly.

use super::{validate_new_item, KnowledgeStore, Session};
use crate::error::{Error, Result};
use crate::knowledge::{ItemPatch, KnowledgeItem, NewItem};
use async_trait::async_trait;

const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// Client for the hosted knowledge item table
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    table: String,
    anon_key: String,
    service_key: Option<String>,
}

impl RestStore {
    pub fn new(
        base_url: impl Into<String>,
        table: impl Into<String>,
        anon_key: impl Into<String>,
        service_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: table.into(),
            anon_key: anon_key.into(),
            service_key,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn as_user(
        &self,
        builder: reqwest::RequestBuilder,
        session: &Session,
    ) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    /// Map a non-success response into the error taxonomy
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Store request failed");
        Err(match status.as_u16() {
            401 | 403 => Error::Auth(format!("Store rejected credentials ({})", status)),
            404 => Error::NotFound(format!("Store resource not found: {}", body)),
            400 | 409 | 422 => Error::Validation(format!("Store rejected request: {}", body)),
            _ => Error::Gateway(format!("Store error {}: {}", status, body)),
        })
    }

    async fn rows(response: reqwest::Response) -> Result<Vec<KnowledgeItem>> {
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("Failed to parse store response: {}", e)))
    }
}

#[async_trait]
impl KnowledgeStore for RestStore {
    async fn list(&self, session: &Session) -> Result<Vec<KnowledgeItem>> {
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let response = self.as_user(request, session).send().await?;
        Self::rows(response).await
    }

    async fn insert(&self, session: &Session, item: NewItem) -> Result<KnowledgeItem> {
        validate_new_item(&item)?;

        let mut body = serde_json::to_value(&item)?;
        body["user_id"] = serde_json::Value::String(session.user_id.clone());

        let request = self
            .client
            .post(self.table_url())
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&body);
        let response = self.as_user(request, session).send().await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Gateway("Store returned no row for insert".to_string()))
    }

    async fn update(
        &self,
        session: &Session,
        id: &str,
        patch: ItemPatch,
    ) -> Result<KnowledgeItem> {
        let request = self
            .client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&patch);
        let response = self.as_user(request, session).send().await?;

        // Rows hidden by row-level security come back as an empty result
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Item '{}' not found", id)))
    }

    async fn delete(&self, session: &Session, id: &str) -> Result<u64> {
        let request = self
            .client
            .delete(self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1);
        let response = self.as_user(request, session).send().await?;
        let response = Self::check(response).await?;

        let removed: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("Failed to parse store response: {}", e)))?;
        Ok(removed.len() as u64)
    }

    async fn recent_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<KnowledgeItem>> {
        let service_key = self
            .service_key
            .as_deref()
            .ok_or_else(|| Error::Config("Service key not configured".to_string()))?;

        let response = self
            .client
            .get(self.table_url())
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .send()
            .await?;
        Self::rows(response).await
    }

    fn name(&self) -> &str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::ItemType;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::{routing::get, Json, Router};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Minimal PostgREST stand-in: one table, owner taken from the bearer
    #[derive(Clone, Default)]
    struct FakeBackend {
        rows: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    fn caller(headers: &HeaderMap) -> Option<String> {
        crate::store::bearer_token(headers).map(|t| t.trim_start_matches("token-").to_string())
    }

    fn id_param(params: &HashMap<String, String>) -> String {
        params
            .get("id")
            .map(|v| v.trim_start_matches("eq.").to_string())
            .unwrap_or_default()
    }

    async fn list(
        State(db): State<FakeBackend>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let rows = db.rows.lock().await;
        if headers.get("apikey").map(|v| v.as_bytes()) == Some(b"service".as_slice()) {
            let owner = params["user_id"].trim_start_matches("eq.").to_string();
            let limit: usize = params["limit"].parse().unwrap();
            let out: Vec<_> = rows
                .iter()
                .rev()
                .filter(|r| r["user_id"] == owner.as_str())
                .take(limit)
                .cloned()
                .collect();
            return Json(out).into_response();
        }
        let Some(user) = caller(&headers) else {
            return StatusCode::UNAUTHORIZED.into_response();
        };
        let out: Vec<_> = rows
            .iter()
            .rev()
            .filter(|r| r["user_id"] == user.as_str())
            .cloned()
            .collect();
        Json(out).into_response()
    }

    async fn insert(
        State(db): State<FakeBackend>,
        Json(mut body): Json<serde_json::Value>,
    ) -> impl IntoResponse {
        let mut rows = db.rows.lock().await;
        body["id"] = serde_json::json!(format!("row-{}", rows.len() + 1));
        body["created_at"] = serde_json::json!("2024-05-01T12:00:00Z");
        body["is_favorite"] = serde_json::json!(false);
        rows.push(body.clone());
        (StatusCode::CREATED, Json(vec![body]))
    }

    async fn update(
        State(db): State<FakeBackend>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
        Json(patch): Json<serde_json::Value>,
    ) -> impl IntoResponse {
        let user = caller(&headers).unwrap_or_default();
        let id = id_param(&params);
        let mut rows = db.rows.lock().await;
        let mut out = Vec::new();
        for row in rows.iter_mut() {
            if row["id"] == id.as_str() && row["user_id"] == user.as_str() {
                for (k, v) in patch.as_object().unwrap() {
                    row[k] = v.clone();
                }
                out.push(row.clone());
            }
        }
        Json(out)
    }

    async fn delete(
        State(db): State<FakeBackend>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let user = caller(&headers).unwrap_or_default();
        let id = id_param(&params);
        let mut rows = db.rows.lock().await;
        let (gone, kept): (Vec<_>, Vec<_>) = rows
            .drain(..)
            .partition(|r| r["id"] == id.as_str() && r["user_id"] == user.as_str());
        *rows = kept;
        Json(gone)
    }

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route(
                "/rest/v1/knowledge_items",
                get(list).post(insert).patch(update).delete(delete),
            )
            .with_state(FakeBackend::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn session(user: &str) -> Session {
        Session::new(user, format!("token-{}", user))
    }

    #[tokio::test]
    async fn test_crud_round_trip() {
        let base = spawn_backend().await;
        let store = RestStore::new(base, "knowledge_items", "anon", Some("service".to_string()));
        let alice = session("alice");

        let mut req = NewItem::new("Zettelkasten");
        req.item_type = ItemType::Article;
        req.tags = vec!["pkm".to_string()];
        let created = store.insert(&alice, req).await.unwrap();
        assert_eq!(created.user_id, "alice");
        assert_eq!(created.item_type, ItemType::Article);

        let listed = store.list(&alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(store.list(&session("bob")).await.unwrap().is_empty());

        let updated = store
            .update(&alice, &created.id, ItemPatch::favorite(true))
            .await
            .unwrap();
        assert!(updated.is_favorite);
        assert_eq!(updated.tags, vec!["pkm".to_string()]);

        assert_eq!(store.delete(&alice, &created.id).await.unwrap(), 1);
        assert_eq!(store.delete(&alice, &created.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_hidden_row_is_not_found() {
        let base = spawn_backend().await;
        let store = RestStore::new(base, "knowledge_items", "anon", None);
        let created = store
            .insert(&session("alice"), NewItem::new("mine"))
            .await
            .unwrap();

        let err = store
            .update(&session("bob"), &created.id, ItemPatch::favorite(true))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recent_for_user_uses_service_key() {
        let base = spawn_backend().await;
        let store = RestStore::new(
            base.clone(),
            "knowledge_items",
            "anon",
            Some("service".to_string()),
        );
        for n in 0..4 {
            store
                .insert(&session("alice"), NewItem::new(format!("n{}", n)))
                .await
                .unwrap();
        }
        let recent = store.recent_for_user("alice", 2).await.unwrap();
        let titles: Vec<&str> = recent.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["n3", "n2"]);

        let without_key = RestStore::new(base, "knowledge_items", "anon", None);
        assert!(matches!(
            without_key.recent_for_user("alice", 2).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let base = spawn_backend().await;
        let store = RestStore::new(base, "knowledge_items", "anon", None);
        let anonymous = Session::new("", "");
        // Empty bearer is rejected by the fake backend
        let err = store.list(&anonymous).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_malformed_delete_response_is_gateway_error() {
        let app = Router::new().route(
            "/rest/v1/knowledge_items",
            axum::routing::delete(|| async { "not json" }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let store = RestStore::new(format!("http://{}", addr), "knowledge_items", "anon", None);
        let err = store.delete(&session("alice"), "row-1").await.unwrap_err();
        assert!(matches!(err, Error::Gateway(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let store = RestStore::new("http://127.0.0.1:9", "knowledge_items", "anon", None);
        let err = store.list(&session("alice")).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
