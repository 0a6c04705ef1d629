//! Enrichment proxy: one item's text in, summary and tags out

use super::gateway::{CompletionGateway, CompletionRequest, ToolDefinition};
use super::types::{EnrichRequest, Enrichment};
use crate::error::{Error, Result};
use crate::knowledge::ChatMessage;
use std::sync::Arc;

pub const ENRICH_TOOL: &str = "process_knowledge";

const SYSTEM_PROMPT: &str = "You are a knowledge processing assistant. Given a knowledge item, return a JSON object with:
- \"summary\": A concise 2-3 sentence summary of the key insights
- \"tags\": An array of 3-5 relevant single-word or short-phrase tags (lowercase)

Respond ONLY with valid JSON, no markdown.";

/// Summarizes and tags a knowledge item through the completion gateway
pub struct Enricher {
    gateway: Arc<dyn CompletionGateway>,
    model: String,
}

impl Enricher {
    pub fn new(gateway: Arc<dyn CompletionGateway>, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
        }
    }

    pub async fn enrich(&self, request: &EnrichRequest) -> Result<Enrichment> {
        let text = compose_text(request);
        if text.is_empty() {
            return Err(Error::Validation("Nothing to process".to_string()));
        }

        let completion = self
            .gateway
            .complete(
                CompletionRequest::new(
                    self.model.clone(),
                    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(text)],
                )
                .force_tool(enrich_tool()),
            )
            .await?;

        let raw = completion
            .tool_arguments
            .or(completion.content)
            .ok_or_else(|| Error::Gateway("AI response had no result".to_string()))?;
        parse_enrichment(&raw)
    }
}

/// `Title:` / `Content:` / `URL:` lines for every non-empty field
pub fn compose_text(request: &EnrichRequest) -> String {
    [
        ("Title", &request.title),
        ("Content", &request.content),
        ("URL", &request.url),
    ]
    .iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}: {}", label, v))
    })
    .collect::<Vec<_>>()
    .join("\n")
}

fn enrich_tool() -> ToolDefinition {
    ToolDefinition::function(
        ENRICH_TOOL,
        "Process a knowledge item and return summary and tags",
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string", "description": "2-3 sentence summary" },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "3-5 relevant tags"
                }
            },
            "required": ["summary", "tags"],
            "additionalProperties": false
        }),
    )
}

fn parse_enrichment(raw: &str) -> Result<Enrichment> {
    // Models sometimes wrap plain-content JSON in a fence
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(trimmed)
        .map_err(|e| Error::Gateway(format!("AI response was not valid enrichment JSON: {}", e)))
}
