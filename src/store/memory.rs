//! In-memory knowledge store
//!
//! Rows live in a single vector in insertion order; reads filter by owner
//! and sort on `created_at`, so ties keep the later insert first.

use super::{validate_new_item, KnowledgeStore, Session};
use crate::error::{Error, Result};
use crate::knowledge::{ItemPatch, KnowledgeItem, NewItem};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store for knowledge items
pub struct MemoryStore {
    rows: Arc<RwLock<Vec<KnowledgeItem>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Total rows across all users
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn newest_first(&self, user_id: &str) -> Vec<KnowledgeItem> {
        let mut items: Vec<KnowledgeItem> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.created_at);
        items.reverse();
        items
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn list(&self, session: &Session) -> Result<Vec<KnowledgeItem>> {
        Ok(self.newest_first(&session.user_id).await)
    }

    async fn insert(&self, session: &Session, item: NewItem) -> Result<KnowledgeItem> {
        validate_new_item(&item)?;

        let row = KnowledgeItem {
            id: Uuid::new_v4().to_string(),
            user_id: session.user_id.clone(),
            title: item.title,
            content: item.content,
            url: item.url,
            item_type: item.item_type,
            tags: item.tags,
            ai_tags: None,
            ai_summary: None,
            is_favorite: false,
            created_at: Utc::now(),
        };

        self.rows.write().await.push(row.clone());
        tracing::debug!(item_id = %row.id, user_id = %row.user_id, "Inserted knowledge item");
        Ok(row)
    }

    async fn update(
        &self,
        session: &Session,
        id: &str,
        patch: ItemPatch,
    ) -> Result<KnowledgeItem> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id && r.user_id == session.user_id)
            .ok_or_else(|| Error::NotFound(format!("Item '{}' not found", id)))?;

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(Error::Validation("Title is required".to_string()));
            }
        }

        patch.apply_to(row);
        Ok(row.clone())
    }

    async fn delete(&self, session: &Session, id: &str) -> Result<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.user_id == session.user_id));
        Ok((before - rows.len()) as u64)
    }

    async fn recent_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<KnowledgeItem>> {
        let mut items = self.newest_first(user_id).await;
        items.truncate(limit);
        Ok(items)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
