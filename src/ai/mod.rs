//! AI proxy functions
//!
//! Two stateless functions in front of an OpenAI-compatible completion
//! gateway: enrichment (summary + tags for one item) and chat (one reply
//! for a transcript, grounded in the caller's recent items).

pub mod chat;
pub mod enrich;
pub mod gateway;
pub mod handler;
pub mod types;

pub use chat::ChatResponder;
pub use enrich::Enricher;
pub use gateway::{Completion, CompletionGateway, CompletionRequest, HttpGateway};
pub use handler::{ai_router, AiState};
pub use types::{ChatReply, ChatRequest, EnrichRequest, Enrichment};
