//! Capture form controller

use super::notice::Notice;
use super::repository::KnowledgeClient;
use crate::knowledge::{ItemType, NewItem};

/// Split comma-separated tag input, dropping blanks
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Editable fields for a new item. Fields survive a failed save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureForm {
    pub title: String,
    pub content: String,
    pub url: String,
    pub item_type: ItemType,
    pub tags: String,
}

impl CaptureForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn to_new_item(&self) -> NewItem {
        NewItem {
            title: self.title.trim().to_string(),
            content: non_empty(&self.content),
            url: non_empty(&self.url),
            item_type: self.item_type,
            tags: parse_tags(&self.tags),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Save through the client. `None` when the form cannot be submitted.
    pub async fn submit(&mut self, client: &KnowledgeClient) -> Option<Notice> {
        if !self.can_submit() {
            return None;
        }
        match client.create(self.to_new_item()).await {
            Ok(item) => {
                tracing::info!(
                    item_id = %item.id,
                    item_type = %item.item_type,
                    "Captured knowledge item"
                );
                self.reset();
                Some(Notice::success("Captured!", "Knowledge item saved."))
            }
            Err(e) => Some(Notice::error("Error", e.to_string())),
        }
    }
}
