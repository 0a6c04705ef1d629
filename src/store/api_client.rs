//! Client for the local items API served by `secondbrain serve`
//!
//! Lets CLI commands share one in-memory store with a running server.

use super::{KnowledgeStore, Session};
use crate::api::ErrorBody;
use crate::error::{Error, Result};
use crate::knowledge::{ItemPatch, KnowledgeItem, NewItem};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub struct ItemsApiStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct DeleteResponse {
    deleted: u64,
}

impl ItemsApiStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn items_url(&self) -> String {
        format!("{}/api/v1/items", self.base_url)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/api/v1/items/{}", self.base_url, id)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return response
                .json()
                .await
                .map_err(|e| Error::Gateway(format!("Failed to parse items API response: {}", e)));
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("Items API returned {}", status));
        Err(match status {
            401 => Error::Auth(message),
            400 => Error::Validation(message),
            404 => Error::NotFound(message),
            _ => Error::Gateway(message),
        })
    }
}

#[async_trait]
impl KnowledgeStore for ItemsApiStore {
    async fn list(&self, session: &Session) -> Result<Vec<KnowledgeItem>> {
        let response = self
            .client
            .get(self.items_url())
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn insert(&self, session: &Session, item: NewItem) -> Result<KnowledgeItem> {
        let response = self
            .client
            .post(self.items_url())
            .bearer_auth(&session.access_token)
            .json(&item)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update(
        &self,
        session: &Session,
        id: &str,
        patch: ItemPatch,
    ) -> Result<KnowledgeItem> {
        let response = self
            .client
            .patch(self.item_url(id))
            .bearer_auth(&session.access_token)
            .json(&patch)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete(&self, session: &Session, id: &str) -> Result<u64> {
        let response = self
            .client
            .delete(self.item_url(id))
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        let body: DeleteResponse = Self::decode(response).await?;
        Ok(body.deleted)
    }

    async fn recent_for_user(&self, _user_id: &str, _limit: usize) -> Result<Vec<KnowledgeItem>> {
        Err(Error::Config(
            "The items API does not serve cross-user context reads".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "items-api"
    }
}
