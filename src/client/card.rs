//! Item card controller
//!
//! One card per displayed item. Enrichment is offered only while the item
//! has no summary, and only one enrichment call per card is in flight at a
//! time. Every action answers with a [`Notice`]; errors never escape the
//! card.
//!
//! The card keeps the latest row it has seen: its own successful updates
//! replace it, and [`ItemCard::set_item`] takes a refetched row.

use super::functions::AiFunctions;
use super::notice::Notice;
use super::repository::KnowledgeClient;
use crate::ai::EnrichRequest;
use crate::error::Result;
use crate::knowledge::{ItemPatch, KnowledgeItem};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

pub struct ItemCard {
    item: RwLock<KnowledgeItem>,
    processing: AtomicBool,
    client: Arc<KnowledgeClient>,
    functions: Arc<dyn AiFunctions>,
}

/// Clears the in-flight flag when the call finishes or is abandoned
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ItemCard {
    pub fn new(
        item: KnowledgeItem,
        client: Arc<KnowledgeClient>,
        functions: Arc<dyn AiFunctions>,
    ) -> Self {
        Self {
            item: RwLock::new(item),
            processing: AtomicBool::new(false),
            client,
            functions,
        }
    }

    /// Snapshot of the row the card currently shows
    pub fn item(&self) -> KnowledgeItem {
        self.item
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-render with a refetched row
    pub fn set_item(&self, item: KnowledgeItem) {
        *self.item.write().unwrap_or_else(PoisonError::into_inner) = item;
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Whether the enrich trigger is shown and enabled
    pub fn can_enrich(&self) -> bool {
        self.item().needs_enrichment() && !self.is_processing()
    }

    /// Run enrichment and persist the result.
    ///
    /// Returns `None` without calling out when enrichment is not offered or
    /// already running on this card.
    pub async fn enrich(&self) -> Option<Notice> {
        if self.processing.swap(true, Ordering::AcqRel) {
            return None;
        }
        let _guard = InFlight(&self.processing);

        let item = self.item();
        if !item.needs_enrichment() {
            return None;
        }

        match self.run_enrichment(&item).await {
            Ok(updated) => {
                tracing::info!(item_id = %item.id, "Item enriched");
                self.set_item(updated);
                Some(Notice::success("AI processed", "Summary and tags generated."))
            }
            Err(e) => {
                tracing::warn!(item_id = %item.id, "Enrichment failed: {}", e);
                Some(Notice::error("AI error", e.to_string()))
            }
        }
    }

    async fn run_enrichment(&self, item: &KnowledgeItem) -> Result<KnowledgeItem> {
        let request = EnrichRequest {
            item_id: Some(item.id.clone()),
            title: Some(item.title.clone()),
            content: item.content.clone(),
            url: item.url.clone(),
        };
        let enrichment = self.functions.enrich(&request).await?;
        self.client
            .update(
                &item.id,
                ItemPatch::enrichment(enrichment.summary, enrichment.tags),
            )
            .await
    }

    /// Flip `is_favorite` relative to the row the card shows
    pub async fn toggle_favorite(&self) -> Notice {
        let item = self.item();
        match self
            .client
            .update(&item.id, ItemPatch::favorite(!item.is_favorite))
            .await
        {
            Ok(updated) => {
                let title = if updated.is_favorite {
                    "Added to favorites"
                } else {
                    "Removed from favorites"
                };
                let notice = Notice::success(title, updated.title.clone());
                self.set_item(updated);
                notice
            }
            Err(e) => {
                tracing::warn!(item_id = %item.id, "Favorite toggle failed: {}", e);
                Notice::error("Error", e.to_string())
            }
        }
    }

    pub async fn delete(&self) -> Notice {
        let id = self.item().id;
        match self.client.delete(&id).await {
            Ok(0) => Notice::success("Deleted", "Item was already removed."),
            Ok(_) => Notice::success("Deleted", "Knowledge item removed."),
            Err(e) => {
                tracing::warn!(item_id = %id, "Delete failed: {}", e);
                Notice::error("Error", e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Enrichment;
    use crate::client::repository::tests::CountingStore;
    use crate::error::Error;
    use crate::knowledge::{ChatMessage, NewItem};
    use crate::store::Session;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Returns a fixed enrichment, optionally waiting on `gate` first
    struct FakeFunctions {
        result: std::result::Result<Enrichment, String>,
        calls: AtomicUsize,
        requests: tokio::sync::Mutex<Vec<EnrichRequest>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeFunctions {
        fn ok(summary: &str, tags: &[&str]) -> Self {
            Self {
                result: Ok(Enrichment {
                    summary: summary.to_string(),
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                }),
                calls: AtomicUsize::new(0),
                requests: Default::default(),
                gate: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                ..Self::ok("", &[])
            }
        }
    }

    #[async_trait]
    impl AiFunctions for FakeFunctions {
        async fn enrich(&self, request: &EnrichRequest) -> Result<Enrichment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().await.push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.result.clone().map_err(Error::Gateway)
        }

        async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
            Ok(String::new())
        }
    }

    async fn setup(
        functions: FakeFunctions,
    ) -> (Arc<CountingStore>, Arc<KnowledgeClient>, Arc<FakeFunctions>, KnowledgeItem) {
        let store = Arc::new(CountingStore::default());
        let client = Arc::new(KnowledgeClient::with_session(
            store.clone(),
            Session::new("alice", "t"),
        ));
        let mut new_item = NewItem::new("X");
        new_item.content = Some(String::new());
        new_item.url = Some(String::new());
        new_item.tags = vec!["mine".to_string()];
        let item = client.create(new_item).await.unwrap();
        (store, client, Arc::new(functions), item)
    }

    #[tokio::test]
    async fn test_enrich_issues_exactly_one_update() {
        let (store, client, functions, item) = setup(FakeFunctions::ok("s", &["a", "b"])).await;
        let card = ItemCard::new(item.clone(), client.clone(), functions.clone());

        let notice = card.enrich().await.unwrap();
        assert!(!notice.is_error());
        assert_eq!(notice.title, "AI processed");

        let sent = functions.requests.lock().await;
        assert_eq!(sent[0].item_id.as_deref(), Some(item.id.as_str()));
        assert_eq!(sent[0].title.as_deref(), Some("X"));

        let updates = store.updates.lock().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, item.id);
        assert_eq!(updates[0].1.ai_summary.as_deref(), Some("s"));
        assert_eq!(
            updates[0].1.ai_tags,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(updates[0].1.tags.is_none());

        let items = client.items().await.unwrap().unwrap();
        assert_eq!(items[0].tags, vec!["mine"]);
        assert_eq!(items[0].ai_summary.as_deref(), Some("s"));
    }

    #[tokio::test]
    async fn test_enrich_failure_leaves_item_unchanged() {
        let (store, client, functions, item) =
            setup(FakeFunctions::failing("AI credits exhausted.")).await;
        let card = ItemCard::new(item, client.clone(), functions);

        let notice = card.enrich().await.unwrap();
        assert!(notice.is_error());
        assert_eq!(notice.title, "AI error");
        assert_eq!(notice.description, "AI credits exhausted.");
        assert!(store.updates.lock().await.is_empty());
        assert!(!card.is_processing());
        assert!(card.can_enrich());
    }

    #[tokio::test]
    async fn test_enrich_not_offered_when_summarized() {
        let (_store, client, functions, mut item) = setup(FakeFunctions::ok("s", &[])).await;
        item.ai_summary = Some("already".to_string());
        let card = ItemCard::new(item, client, functions.clone());
        assert!(!card.can_enrich());
        assert!(card.enrich().await.is_none());
        assert_eq!(functions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_trigger_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let mut fake = FakeFunctions::ok("s", &["a"]);
        fake.gate = Some(gate.clone());
        let (store, client, functions, item) = setup(fake).await;
        let card = ItemCard::new(item, client, functions.clone());

        let first = card.enrich();
        let second = async {
            tokio::task::yield_now().await;
            assert!(card.is_processing());
            assert!(!card.can_enrich());
            let skipped = card.enrich().await;
            gate.notify_one();
            skipped
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(functions.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.updates.lock().await.len(), 1);
        assert!(!card.is_processing());
    }

    #[tokio::test]
    async fn test_enriched_card_is_not_reenriched() {
        let (store, client, functions, item) = setup(FakeFunctions::ok("s", &["a"])).await;
        let card = ItemCard::new(item, client, functions.clone());

        assert!(card.enrich().await.is_some());
        assert_eq!(card.item().ai_summary.as_deref(), Some("s"));
        assert!(!card.can_enrich());

        assert!(card.enrich().await.is_none());
        assert_eq!(functions.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.updates.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_set_item_takes_refetched_row() {
        let (_store, client, functions, item) = setup(FakeFunctions::ok("s", &[])).await;
        let card = ItemCard::new(item.clone(), client, functions.clone());

        let mut refetched = item;
        refetched.ai_summary = Some("from elsewhere".to_string());
        card.set_item(refetched);

        assert!(!card.can_enrich());
        assert!(card.enrich().await.is_none());
        assert_eq!(functions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_round_trips() {
        let (store, client, functions, item) = setup(FakeFunctions::ok("s", &[])).await;
        let card = ItemCard::new(item, client.clone(), functions);

        let notice = card.toggle_favorite().await;
        assert!(!notice.is_error());
        assert_eq!(notice.title, "Added to favorites");
        assert!(card.item().is_favorite);

        let notice = card.toggle_favorite().await;
        assert_eq!(notice.title, "Removed from favorites");
        assert!(!card.item().is_favorite);

        let updates = store.updates.lock().await;
        assert_eq!(updates[0].1.is_favorite, Some(true));
        assert_eq!(updates[1].1.is_favorite, Some(false));
        assert!(!client.items().await.unwrap().unwrap()[0].is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_failure_is_a_notice() {
        let (store, client, functions, item) = setup(FakeFunctions::ok("s", &[])).await;
        let card = ItemCard::new(item, client.clone(), functions);
        client.sign_out().await;

        let notice = card.toggle_favorite().await;
        assert!(notice.is_error());
        assert_eq!(notice.title, "Error");
        assert!(notice.description.contains("No active session"));
        assert!(!card.item().is_favorite);
        assert!(store.updates.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_notices() {
        let (_store, client, functions, item) = setup(FakeFunctions::ok("s", &[])).await;
        let card = ItemCard::new(item, client.clone(), functions);

        let first = card.delete().await;
        assert!(!first.is_error());
        assert_eq!(first.description, "Knowledge item removed.");
        let second = card.delete().await;
        assert!(!second.is_error());
        assert_eq!(second.description, "Item was already removed.");
        assert!(client.items().await.unwrap().unwrap().is_empty());

        client.sign_out().await;
        let failed = card.delete().await;
        assert!(failed.is_error());
        assert!(failed.description.contains("No active session"));
    }
}
