//! Completion gateway client (OpenAI-compatible `/chat/completions`)
//!
//! Both proxy functions go through [`CompletionGateway`]; the HTTP
//! implementation maps the gateway's quota responses onto the error
//! taxonomy and never retries.

use crate::error::{Error, Result};
use crate::knowledge::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const RATE_LIMITED_MESSAGE: &str = "Rate limited. Try again shortly.";
pub const QUOTA_EXHAUSTED_MESSAGE: &str = "AI credits exhausted.";

/// Function tool offered to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Request body for `/chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: None,
            tool_choice: None,
        }
    }

    /// Offer a single function tool and force the model to call it
    pub fn force_tool(mut self, tool: ToolDefinition) -> Self {
        self.tool_choice = Some(serde_json::json!({
            "type": "function",
            "function": { "name": tool.function.name },
        }));
        self.tools = Some(vec![tool]);
        self
    }
}

/// The parts of a completion the proxies consume
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Assistant text, if any
    pub content: Option<String>,
    /// Raw JSON arguments of the first tool call, if any
    pub tool_arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

impl From<CompletionResponse> for Completion {
    fn from(response: CompletionResponse) -> Self {
        match response.choices.into_iter().next() {
            Some(choice) => Self {
                content: choice.message.content,
                tool_arguments: choice
                    .message
                    .tool_calls
                    .into_iter()
                    .next()
                    .map(|c| c.function.arguments),
            },
            None => Self::default(),
        }
    }
}

/// Remote completion service
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}

/// HTTP gateway client
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    api_key_ref: String,
    api_key: Option<String>,
}

impl HttpGateway {
    /// `api_key_ref` names the key in error messages when it is missing
    pub fn new(
        base_url: impl Into<String>,
        api_key_ref: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key_ref: api_key_ref.into(),
            api_key,
        }
    }
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} not configured", self.api_key_ref)))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => Error::RateLimited(RATE_LIMITED_MESSAGE.to_string()),
                402 => Error::QuotaExhausted(QUOTA_EXHAUSTED_MESSAGE.to_string()),
                code => {
                    let body = response.text().await.unwrap_or_default();
                    tracing::error!(status = code, body = %body, "AI gateway error");
                    Error::Gateway("AI gateway error".to_string())
                }
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("Malformed gateway response: {}", e)))?;
        Ok(parsed.into())
    }
}
