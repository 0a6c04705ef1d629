//! Knowledge item wire types
//!
//! Field names follow the hosted table's column names (snake_case), so the
//! same types serialize for the hosted backend, the local items API and the
//! proxy functions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of knowledge item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Note,
    Link,
    Insight,
    Article,
}

impl ItemType {
    pub const ALL: [ItemType; 4] = [
        ItemType::Note,
        ItemType::Link,
        ItemType::Insight,
        ItemType::Article,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Link => "link",
            Self::Insight => "insight",
            Self::Article => "article",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Self::Note),
            "link" => Ok(Self::Link),
            "insight" => Ok(Self::Insight),
            "article" => Ok(Self::Article),
            other => Err(format!("unknown item type: {}", other)),
        }
    }
}

/// A captured knowledge item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ai_tags: Option<Vec<String>>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeItem {
    /// Whether AI enrichment is still on offer for this item
    pub fn needs_enrichment(&self) -> bool {
        self.ai_summary.is_none()
    }

    /// User tags followed by AI tags
    pub fn all_tags(&self) -> impl Iterator<Item = &String> {
        self.tags.iter().chain(self.ai_tags.iter().flatten())
    }
}

/// Fields supplied when creating an item; the store stamps the rest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Partial update. `None` leaves a field untouched.
///
/// `id`, `user_id` and `created_at` are absent: they never
/// change after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl ItemPatch {
    pub fn favorite(is_favorite: bool) -> Self {
        Self {
            is_favorite: Some(is_favorite),
            ..Default::default()
        }
    }

    pub fn enrichment(summary: String, tags: Vec<String>) -> Self {
        Self {
            ai_summary: Some(summary),
            ai_tags: Some(tags),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to an item in place
    pub fn apply_to(&self, item: &mut KnowledgeItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(content) = &self.content {
            item.content = Some(content.clone());
        }
        if let Some(url) = &self.url {
            item.url = Some(url.clone());
        }
        if let Some(item_type) = self.item_type {
            item.item_type = item_type;
        }
        if let Some(tags) = &self.tags {
            item.tags = tags.clone();
        }
        if let Some(ai_tags) = &self.ai_tags {
            item.ai_tags = Some(ai_tags.clone());
        }
        if let Some(ai_summary) = &self.ai_summary {
            item.ai_summary = Some(ai_summary.clone());
        }
        if let Some(is_favorite) = self.is_favorite {
            item.is_favorite = is_favorite;
        }
    }
}

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> KnowledgeItem {
        KnowledgeItem {
            id: "item-1".to_string(),
            user_id: "user-1".to_string(),
            title: "Rust Ownership".to_string(),
            content: Some("Borrowing rules".to_string()),
            url: None,
            item_type: ItemType::Insight,
            tags: vec!["rust".to_string()],
            ai_tags: None,
            ai_summary: None,
            is_favorite: false,
            created_at: "2024-03-01T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_item_serialization_uses_column_names() {
        let json = serde_json::to_string(&sample_item()).unwrap();
        assert!(json.contains("\"item_type\":\"insight\""));
        assert!(json.contains("\"is_favorite\":false"));
        assert!(json.contains("\"ai_summary\":null"));
        assert!(json.contains("\"created_at\":\"2024-03-01T10:00:00Z\""));
    }

    #[test]
    fn test_item_deserialize_with_nulls() {
        let json = r#"{
            "id": "abc",
            "user_id": "u",
            "title": "T",
            "content": null,
            "url": null,
            "item_type": "link",
            "tags": [],
            "ai_tags": null,
            "ai_summary": null,
            "is_favorite": true,
            "created_at": "2024-01-01T00:00:00+00:00"
        }"#;
        let item: KnowledgeItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_type, ItemType::Link);
        assert!(item.is_favorite);
        assert!(item.needs_enrichment());
    }

    #[test]
    fn test_new_item_defaults() {
        let req: NewItem = serde_json::from_str(r#"{"title": "Hello"}"#).unwrap();
        assert_eq!(req.item_type, ItemType::Note);
        assert!(req.tags.is_empty());
        assert!(req.content.is_none());
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = ItemPatch::favorite(true);
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"is_favorite":true}"#);
    }

    #[test]
    fn test_enrichment_patch_leaves_user_tags() {
        let mut item = sample_item();
        ItemPatch::enrichment("s".to_string(), vec!["a".to_string(), "b".to_string()])
            .apply_to(&mut item);
        assert_eq!(item.ai_summary.as_deref(), Some("s"));
        assert_eq!(item.ai_tags, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(item.tags, vec!["rust".to_string()]);
        assert!(!item.needs_enrichment());
    }

    #[test]
    fn test_all_tags_order() {
        let mut item = sample_item();
        item.ai_tags = Some(vec!["memory".to_string()]);
        let tags: Vec<&String> = item.all_tags().collect();
        assert_eq!(tags, vec!["rust", "memory"]);
    }

    #[test]
    fn test_item_type_from_str() {
        assert_eq!("article".parse::<ItemType>().unwrap(), ItemType::Article);
        assert!("video".parse::<ItemType>().is_err());
        assert_eq!(ItemType::Link.to_string(), "link");
    }

    #[test]
    fn test_chat_message_roles() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
