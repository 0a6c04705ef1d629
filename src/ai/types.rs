//! Proxy function wire types

use crate::knowledge::ChatMessage;
use serde::{Deserialize, Serialize};

/// Body of an enrichment call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichRequest {
    /// Sent by the card for correlation; the proxy does not use it
    #[serde(rename = "itemId", default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Result of an enrichment call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of a chat call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Successful chat reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
}
