//! SecondBrain configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main SecondBrain configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecondBrainConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Chat proxy configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Client-side configuration used by the CLI commands
    #[serde(default)]
    pub client: ClientConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18790,
            cors_origins: Vec::new(),
        }
    }
}

/// Completion gateway configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,

    /// Model requested for enrichment and chat
    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_ref: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ai.gateway.lovable.dev/v1".to_string(),
            model: "google/gemini-3-flash-preview".to_string(),
            api_key_ref: "LOVABLE_API_KEY".to_string(),
        }
    }
}

/// Which store implementation backs the knowledge items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, lost on restart
    #[default]
    Memory,
    /// Hosted PostgREST-style backend
    Rest,
}

/// Knowledge store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend selection
    pub backend: StoreBackend,

    /// Hosted backend URL (rest backend only)
    pub url: String,

    /// Table holding knowledge items
    pub table: String,

    /// Environment variable holding the public (anon) key
    pub anon_key_ref: String,

    /// Environment variable holding the service-role key used for chat context
    pub service_key_ref: String,

    /// Bearer token → user id map accepted by the memory backend
    #[serde(default)]
    pub local_tokens: HashMap<String, String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: String::new(),
            table: "knowledge_items".to_string(),
            anon_key_ref: "SUPABASE_ANON_KEY".to_string(),
            service_key_ref: "SUPABASE_SERVICE_ROLE_KEY".to_string(),
            local_tokens: HashMap::new(),
        }
    }
}

/// Chat proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum number of recent items rendered into the context block
    pub context_limit: usize,

    /// Content characters shown for items without a summary
    pub snippet_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_limit: 30,
            snippet_chars: 200,
        }
    }
}

/// Client-side configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the proxy functions
    pub functions_url: String,

    /// Access token presented to the store and the chat proxy
    pub access_token: Option<String>,

    /// User id the access token belongs to
    pub user_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            functions_url: "http://127.0.0.1:18790".to_string(),
            access_token: None,
            user_id: None,
        }
    }
}

impl SecondBrainConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from an explicit path, else the default location, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Default config file location (`<config_dir>/secondbrain/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|d| d.join("secondbrain").join("config.toml"))
    }

    /// Serialize as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Resolve a secret from the environment.
///
/// Tries the exact variable name first, then its UPPER_CASE form.
pub fn resolve_secret(key_ref: &str) -> Option<String> {
    std::env::var(key_ref)
        .or_else(|_| std::env::var(key_ref.to_uppercase()))
        .ok()
        .filter(|v| !v.is_empty())
}
