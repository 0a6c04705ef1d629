//! Client for the AI proxy functions

use crate::ai::{ChatReply, ChatRequest, EnrichRequest, Enrichment};
use crate::api::ErrorBody;
use crate::error::{Error, Result};
use crate::knowledge::ChatMessage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// The two proxy functions as seen from the client
#[async_trait]
pub trait AiFunctions: Send + Sync {
    async fn enrich(&self, request: &EnrichRequest) -> Result<Enrichment>;

    /// One assistant reply for the full transcript
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// HTTP client for `/functions/v1/*`
pub struct FunctionsClient {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl FunctionsClient {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    async fn invoke<B, T>(&self, function: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(format!("{}/functions/v1/{}", self.base_url, function))
            .json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        // An `{error}` payload is a failure whatever the status
        if let Ok(ErrorBody { error }) = serde_json::from_slice::<ErrorBody>(&bytes) {
            return Err(match status {
                429 => Error::RateLimited(error),
                402 => Error::QuotaExhausted(error),
                _ => Error::Gateway(error),
            });
        }
        if !(200..300).contains(&status) {
            return Err(Error::Gateway(format!("{} returned {}", function, status)));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl AiFunctions for FunctionsClient {
    async fn enrich(&self, request: &EnrichRequest) -> Result<Enrichment> {
        self.invoke("ai-process", request).await
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest {
            messages: messages.to_vec(),
        };
        let reply: ChatReply = self.invoke("ai-chat", &body).await?;
        Ok(reply.content)
    }
}
