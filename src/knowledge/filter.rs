//! Filter/sort pipeline over a user's item collection
//!
//! ```text
//! items ─▶ search ─▶ type ─▶ favorites ─▶ sort ─▶ Vec<KnowledgeItem>
//! ```
//!
//! The pipeline is pure: the input slice is never touched and every call
//! yields a fresh vector.

use super::types::{ItemType, KnowledgeItem};
use serde::{Deserialize, Serialize};

/// Ordering applied after filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Descending `created_at`
    #[default]
    Newest,
    /// Ascending `created_at`
    Oldest,
    /// Ascending, case-sensitive `title`; equal titles keep input order
    Title,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "title" | "alpha" | "alphabetical" => Ok(Self::Title),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Item type filter with an "all" sentinel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Only(ItemType),
}

impl TypeFilter {
    fn admits(&self, item: &KnowledgeItem) -> bool {
        match self {
            Self::All => true,
            Self::Only(t) => item.item_type == *t,
        }
    }
}

impl std::str::FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Everything the dashboard controls feed into the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub search: String,
    pub item_type: TypeFilter,
    pub favorites_only: bool,
    pub sort: SortOrder,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn item_type(mut self, item_type: TypeFilter) -> Self {
        self.item_type = item_type;
        self
    }

    pub fn favorites_only(mut self, favorites_only: bool) -> Self {
        self.favorites_only = favorites_only;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// Normalize a search string into the needle used for matching.
///
/// Returns `None` (match everything) when nothing searchable is left after
/// trimming, i.e. the query is blank or only punctuation.
fn search_needle(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        Some(trimmed.to_lowercase())
    } else {
        None
    }
}

fn matches_search(item: &KnowledgeItem, needle: &str) -> bool {
    item.title.to_lowercase().contains(needle)
        || item
            .content
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(needle))
        || item.all_tags().any(|t| t.to_lowercase().contains(needle))
}

/// Run the pipeline
pub fn apply(items: &[KnowledgeItem], query: &ItemQuery) -> Vec<KnowledgeItem> {
    let needle = search_needle(&query.search);

    let mut result: Vec<KnowledgeItem> = items
        .iter()
        .filter(|i| needle.as_deref().map_or(true, |n| matches_search(i, n)))
        .filter(|i| query.item_type.admits(i))
        .filter(|i| !query.favorites_only || i.is_favorite)
        .cloned()
        .collect();

    match query.sort {
        SortOrder::Oldest => result.sort_by_key(|i| i.created_at),
        SortOrder::Newest => {
            result.sort_by_key(|i| i.created_at);
            result.reverse();
        }
        SortOrder::Title => result.sort_by(|a, b| a.title.cmp(&b.title)),
    }

    result
}
