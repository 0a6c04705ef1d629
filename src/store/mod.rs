//! Store module: persistence of knowledge items
//!
//! `KnowledgeStore` is the typed read/insert/update/delete surface every
//! other component talks to. Three backends ship:
//!
//! - [`MemoryStore`]: in-process rows behind a `RwLock`, used for local mode
//!   and tests
//! - [`RestStore`]: the hosted PostgREST-style backend
//! - [`ItemsApiStore`]: a running `secondbrain serve`, over its items API
//!
//! Ownership is enforced by the backend: a caller only ever sees or mutates
//! rows whose `user_id` matches its session.

pub mod api_client;
pub mod auth;
pub mod handler;
pub mod memory;
pub mod rest;

pub use api_client::ItemsApiStore;
pub use auth::{bearer_token, Authenticator, RestAuth, StaticTokens};
pub use handler::{items_router, ItemsState};
pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::error::{Error, Result};
use crate::knowledge::{ItemPatch, KnowledgeItem, NewItem};
use async_trait::async_trait;

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

/// Typed operations against the knowledge item table
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// All of the caller's items, newest first
    async fn list(&self, session: &Session) -> Result<Vec<KnowledgeItem>>;

    /// Insert a new item; the store stamps id, owner and creation time
    async fn insert(&self, session: &Session, item: NewItem) -> Result<KnowledgeItem>;

    /// Apply a partial update to one of the caller's items
    async fn update(&self, session: &Session, id: &str, patch: ItemPatch)
        -> Result<KnowledgeItem>;

    /// Delete by id, returning the number of rows removed (0 if absent)
    async fn delete(&self, session: &Session, id: &str) -> Result<u64>;

    /// A user's most recent items, read with service privileges
    async fn recent_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<KnowledgeItem>>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Reject items the table would not accept
pub(crate) fn validate_new_item(item: &NewItem) -> Result<()> {
    if item.title.trim().is_empty() {
        return Err(Error::Validation("Title is required".to_string()));
    }
    Ok(())
}
