//! Knowledge module: the item model and the dashboard's filter/sort pipeline

pub mod filter;
pub mod types;

pub use filter::{apply, ItemQuery, SortOrder, TypeFilter};
pub use types::{ChatMessage, ItemPatch, ItemType, KnowledgeItem, NewItem, Role};
