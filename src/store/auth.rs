//! Caller resolution from bearer credentials
//!
//! The hosted backend resolves a bearer token through its auth endpoint;
//! the local backend accepts a fixed token → user map from configuration.

use crate::error::{Error, Result};
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use std::collections::HashMap;

/// Resolves a bearer token to the user it belongs to
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Ok(None)` when the token is unknown, expired or anonymous
    async fn resolve(&self, token: &str) -> Result<Option<String>>;
}

/// Extract the bearer token from an `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Fixed token table for the local backend
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Add a token for a user
    pub fn with(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }
}

#[async_trait]
impl Authenticator for StaticTokens {
    async fn resolve(&self, token: &str) -> Result<Option<String>> {
        Ok(self.tokens.get(token).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

/// Resolves tokens against the hosted backend's `/auth/v1/user` endpoint
pub struct RestAuth {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestAuth {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Authenticator for RestAuth {
    async fn resolve(&self, token: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Gateway(format!("Auth endpoint returned {}", status)));
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("Failed to parse auth user: {}", e)))?;
        Ok(Some(user.id))
    }
}
