//! Client-side item repository
//!
//! Wraps a [`KnowledgeStore`] with the owner-keyed [`ItemCache`]. Reads are
//! served from the cache; every successful mutation invalidates the
//! signed-in user's entry so the next read refetches. There is no
//! optimistic patching of the cached snapshot.

use super::cache::{ItemCache, Snapshot};
use crate::error::{Error, Result};
use crate::knowledge::{self, ItemPatch, ItemQuery, KnowledgeItem, NewItem};
use crate::store::{KnowledgeStore, Session};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct KnowledgeClient {
    store: Arc<dyn KnowledgeStore>,
    cache: ItemCache,
    session: RwLock<Option<Session>>,
}

impl KnowledgeClient {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            store,
            cache: ItemCache::new(),
            session: RwLock::new(None),
        }
    }

    pub fn with_session(store: Arc<dyn KnowledgeStore>, session: Session) -> Self {
        Self {
            store,
            cache: ItemCache::new(),
            session: RwLock::new(Some(session)),
        }
    }

    pub async fn sign_in(&self, session: Session) {
        tracing::debug!(user_id = %session.user_id, "Signed in");
        *self.session.write().await = Some(session);
    }

    pub async fn sign_out(&self) {
        *self.session.write().await = None;
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn require_session(&self) -> Result<Session> {
        self.session()
            .await
            .ok_or_else(|| Error::Auth("No active session".to_string()))
    }

    /// The caller's collection, newest first. `None` when signed out.
    pub async fn items(&self) -> Result<Option<Snapshot>> {
        let Some(session) = self.session().await else {
            return Ok(None);
        };
        let items = self
            .cache
            .get_or_fetch(&session.user_id, || self.store.list(&session))
            .await?;
        Ok(Some(items))
    }

    /// Cached collection run through the filter/sort pipeline
    pub async fn query(&self, query: &ItemQuery) -> Result<Option<Vec<KnowledgeItem>>> {
        Ok(self
            .items()
            .await?
            .map(|items| knowledge::apply(&items, query)))
    }

    /// What to show when a query yields nothing: an empty collection reads
    /// differently from filters that match nothing
    pub async fn empty_listing(&self) -> Result<&'static str> {
        let collection_empty = self.items().await?.map_or(true, |all| all.is_empty());
        Ok(if collection_empty {
            "Start capturing knowledge"
        } else {
            "No items match your filters"
        })
    }

    pub async fn create(&self, item: NewItem) -> Result<KnowledgeItem> {
        let session = self.require_session().await?;
        let created = self.store.insert(&session, item).await?;
        self.cache.invalidate(&session.user_id).await;
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: ItemPatch) -> Result<KnowledgeItem> {
        let session = self.require_session().await?;
        let updated = self.store.update(&session, id, patch).await?;
        self.cache.invalidate(&session.user_id).await;
        Ok(updated)
    }

    /// Rows removed; deleting an unknown id succeeds with 0
    pub async fn delete(&self, id: &str) -> Result<u64> {
        let session = self.require_session().await?;
        let deleted = self.store.delete(&session, id).await?;
        self.cache.invalidate(&session.user_id).await;
        Ok(deleted)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// MemoryStore wrapper that counts calls
    #[derive(Default)]
    pub(crate) struct CountingStore {
        pub inner: MemoryStore,
        pub lists: AtomicUsize,
        pub updates: tokio::sync::Mutex<Vec<(String, ItemPatch)>>,
    }

    #[async_trait]
    impl KnowledgeStore for CountingStore {
        async fn list(&self, session: &Session) -> Result<Vec<KnowledgeItem>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list(session).await
        }

        async fn insert(&self, session: &Session, item: NewItem) -> Result<KnowledgeItem> {
            self.inner.insert(session, item).await
        }

        async fn update(
            &self,
            session: &Session,
            id: &str,
            patch: ItemPatch,
        ) -> Result<KnowledgeItem> {
            self.updates
                .lock()
                .await
                .push((id.to_string(), patch.clone()));
            self.inner.update(session, id, patch).await
        }

        async fn delete(&self, session: &Session, id: &str) -> Result<u64> {
            self.inner.delete(session, id).await
        }

        async fn recent_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<KnowledgeItem>> {
            self.inner.recent_for_user(user_id, limit).await
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn signed_in(store: Arc<CountingStore>) -> KnowledgeClient {
        KnowledgeClient::with_session(store, Session::new("alice", "t-alice"))
    }

    #[tokio::test]
    async fn test_signed_out_read_is_none() {
        let store = Arc::new(CountingStore::default());
        let client = KnowledgeClient::new(store.clone());
        assert!(client.items().await.unwrap().is_none());
        assert_eq!(store.lists.load(Ordering::SeqCst), 0);

        let err = client.create(NewItem::new("x")).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_mutation_invalidates_and_refetches() {
        let store = Arc::new(CountingStore::default());
        let client = signed_in(store.clone());

        assert!(client.items().await.unwrap().unwrap().is_empty());
        client.items().await.unwrap();
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);

        let created = client.create(NewItem::new("Rust Ownership")).await.unwrap();
        let items = client.items().await.unwrap().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(store.lists.load(Ordering::SeqCst), 2);

        client
            .update(&created.id, ItemPatch::favorite(true))
            .await
            .unwrap();
        let items = client.items().await.unwrap().unwrap();
        assert!(items[0].is_favorite);
        assert_eq!(store.lists.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_listing_message() {
        let store = Arc::new(CountingStore::default());
        let client = signed_in(store.clone());
        assert_eq!(
            client.empty_listing().await.unwrap(),
            "Start capturing knowledge"
        );

        client.create(NewItem::new("Rust Ownership")).await.unwrap();
        let none = client
            .query(&ItemQuery::new().favorites_only(true))
            .await
            .unwrap()
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(
            client.empty_listing().await.unwrap(),
            "No items match your filters"
        );
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let store = Arc::new(CountingStore::default());
        let client = signed_in(store.clone());
        client.items().await.unwrap();

        let err = client
            .update("missing", ItemPatch::favorite(true))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        client.items().await.unwrap();
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = Arc::new(CountingStore::default());
        let client = signed_in(store);
        let created = client.create(NewItem::new("gone")).await.unwrap();
        assert_eq!(client.delete(&created.id).await.unwrap(), 1);
        assert_eq!(client.delete(&created.id).await.unwrap(), 0);
        assert!(client.items().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_runs_pipeline() {
        let store = Arc::new(CountingStore::default());
        let client = signed_in(store);
        client.create(NewItem::new("Rust Ownership")).await.unwrap();
        client.create(NewItem::new("Bread")).await.unwrap();

        let found = client
            .query(&ItemQuery::new().search("RUST"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Rust Ownership");
    }
}
