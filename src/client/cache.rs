//! Owner-keyed item cache
//!
//! Each user's collection is held as one immutable snapshot and replaced
//! wholesale on refetch. Invalidation bumps a generation counter; a fetch
//! that started under an older generation still lands, but leaves the
//! entry stale so the next read fetches again.

use crate::error::Result;
use crate::knowledge::KnowledgeItem;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type Snapshot = Arc<Vec<KnowledgeItem>>;

#[derive(Debug, Default)]
struct Entry {
    items: Option<Snapshot>,
    stale: bool,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct ItemCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot for a user, if present and not invalidated
    pub async fn fresh(&self, user_id: &str) -> Option<Snapshot> {
        let entries = self.entries.read().await;
        entries
            .get(user_id)
            .filter(|e| !e.stale)
            .and_then(|e| e.items.clone())
    }

    /// Mark a user's entry stale; the next read refetches
    pub async fn invalidate(&self, user_id: &str) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(user_id.to_string()).or_default();
        entry.stale = true;
        entry.generation += 1;
    }

    /// Serve the fresh snapshot or run `fetch` and store its result
    pub async fn get_or_fetch<F, Fut>(&self, user_id: &str, fetch: F) -> Result<Snapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<KnowledgeItem>>>,
    {
        if let Some(items) = self.fresh(user_id).await {
            return Ok(items);
        }

        let started = self.generation(user_id).await;
        tracing::debug!(user_id = %user_id, "Refetching knowledge items");
        let items: Snapshot = Arc::new(fetch().await?);
        self.land(user_id, started, items.clone()).await;
        Ok(items)
    }

    async fn generation(&self, user_id: &str) -> u64 {
        self.entries
            .read()
            .await
            .get(user_id)
            .map(|e| e.generation)
            .unwrap_or(0)
    }

    async fn land(&self, user_id: &str, started: u64, items: Snapshot) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(user_id.to_string()).or_default();
        entry.items = Some(items);
        entry.stale = entry.generation != started;
    }
}
