//! SecondBrain - Personal Knowledge Capture with AI Enrichment
//!
//! Users save short knowledge items (notes, links, insights, articles),
//! optionally enrich them with AI-generated summaries and tags, and query
//! their collection through a chat assistant grounded in their own items.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────── client ─────────────────────────────┐
//! │  CaptureForm      ItemCard (grid)              ChatAssistant    │
//! │       │            │        │                        │          │
//! │       │            │        └────── enrich ──┐       │ chat     │
//! │       ▼            ▼                         ▼       ▼          │
//! │  ┌──────────────────────────┐          ┌──────────────────┐     │
//! │  │ KnowledgeClient          │          │ FunctionsClient  │     │
//! │  │  ItemCache (per user)    │          └────────┬─────────┘     │
//! │  │  filter/sort pipeline    │                   │               │
//! │  └────────────┬─────────────┘                   │               │
//! └───────────────┼─────────────────────────────────┼───────────────┘
//!                 │ KnowledgeStore                  │ /functions/v1/*
//!                 ▼                                 ▼
//!   ┌──────────────────────────┐       ┌──────────────────────────────┐
//!   │ MemoryStore / RestStore  │◄──────│ Enricher      ChatResponder  │
//!   │ / ItemsApiStore          │context└──────────────┬───────────────┘
//!   └──────────────────────────┘                      │ /chat/completions
//!                                                     ▼
//!                                          completion gateway
//! ```
//!
//! ## Modules
//!
//! - [`knowledge`]: item types and the filter/sort pipeline
//! - [`store`]: persistence backends, caller resolution, local items API
//! - [`ai`]: enrichment and chat proxy functions
//! - [`client`]: cache, repository and headless UI controllers
//! - [`api`]: the combined HTTP application
//! - [`config`]: configuration management

pub mod ai;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod store;

pub use config::SecondBrainConfig;
pub use error::{Error, Result};
