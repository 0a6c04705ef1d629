//! Chat proxy
//!
//! Each call is stateless: the caller is re-resolved from the bearer
//! credential, their most recent items are rendered into a context block,
//! and the system prompt built from it is prepended to the transcript.
//! A caller that cannot be resolved is answered without context, never
//! with an auth error. Only user and assistant turns are forwarded.

use super::gateway::{CompletionGateway, CompletionRequest};
use crate::config::ChatConfig;
use crate::error::Result;
use crate::knowledge::{ChatMessage, KnowledgeItem, Role};
use crate::store::{Authenticator, KnowledgeStore};
use std::fmt::Write;
use std::sync::Arc;

pub const EMPTY_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Answers chat transcripts with the caller's knowledge as context
pub struct ChatResponder {
    gateway: Arc<dyn CompletionGateway>,
    store: Arc<dyn KnowledgeStore>,
    auth: Arc<dyn Authenticator>,
    model: String,
    config: ChatConfig,
}

impl ChatResponder {
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        store: Arc<dyn KnowledgeStore>,
        auth: Arc<dyn Authenticator>,
        model: impl Into<String>,
        config: ChatConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            auth,
            model: model.into(),
            config,
        }
    }

    pub async fn respond(
        &self,
        bearer: Option<&str>,
        messages: Vec<ChatMessage>,
    ) -> Result<String> {
        let context = self.context_for(bearer).await;

        let mut transcript = Vec::with_capacity(messages.len() + 1);
        transcript.push(ChatMessage::system(system_prompt(&context)));
        transcript.extend(messages.into_iter().filter(|m| m.role != Role::System));

        let completion = self
            .gateway
            .complete(CompletionRequest::new(self.model.clone(), transcript))
            .await?;

        Ok(completion
            .content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }

    /// Rendered context block, empty when the caller or their items are unavailable
    async fn context_for(&self, bearer: Option<&str>) -> String {
        let Some(token) = bearer else {
            tracing::debug!("Chat without credential, answering without context");
            return String::new();
        };

        let user_id = match self.auth.resolve(token).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::debug!("Chat credential did not resolve to a user");
                return String::new();
            }
            Err(e) => {
                tracing::warn!("Caller resolution failed: {}", e);
                return String::new();
            }
        };

        match self
            .store
            .recent_for_user(&user_id, self.config.context_limit)
            .await
        {
            Ok(items) => {
                tracing::debug!(user_id = %user_id, count = items.len(), "Loaded chat context");
                render_context(&items, self.config.snippet_chars)
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, "Failed to load chat context: {}", e);
                String::new()
            }
        }
    }
}

/// One numbered line per item
pub fn render_context(items: &[KnowledgeItem], snippet_chars: usize) -> String {
    let mut out = String::new();
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let _ = write!(out, "[{}] {}: \"{}\"", idx + 1, item.item_type, item.title);

        let content = item.content.as_deref().filter(|c| !c.is_empty());
        if let Some(summary) = item.ai_summary.as_deref() {
            let _ = write!(out, " — {}", summary);
        } else if let Some(content) = content {
            let snippet: String = content.chars().take(snippet_chars).collect();
            let _ = write!(out, " — {}", snippet);
        }

        let tags: Vec<&str> = item.all_tags().map(String::as_str).collect();
        if !tags.is_empty() {
            let _ = write!(out, " (tags: {})", tags.join(", "));
        }
    }
    out
}

pub fn system_prompt(context: &str) -> String {
    let knowledge = if context.is_empty() {
        "The user has no knowledge items yet. Encourage them to start capturing knowledge."
            .to_string()
    } else {
        format!(
            "Here are the user's knowledge items:\n{}\n\nUse these items to answer questions. \
             Reference specific items when relevant. If the question is not related to their \
             knowledge base, still help but note that.",
            context
        )
    };

    format!(
        "You are a helpful Second Brain assistant. You help users query and understand their \
         personal knowledge base.\n\n{}\n\nBe concise, insightful, and helpful. If referencing a \
         knowledge item, mention its title.",
        knowledge
    )
}
