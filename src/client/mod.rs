//! Client side of SecondBrain
//!
//! Headless controllers for the item grid, capture form and chat panel,
//! on top of a cached repository and the AI function client. A renderer
//! draws their observable state: loading flags, transcripts and notices.

pub mod assistant;
pub mod cache;
pub mod capture;
pub mod card;
pub mod functions;
pub mod notice;
pub mod repository;

pub use assistant::{ChatAssistant, ChatState};
pub use cache::{ItemCache, Snapshot};
pub use capture::{parse_tags, CaptureForm};
pub use card::ItemCard;
pub use functions::{AiFunctions, FunctionsClient};
pub use notice::{Notice, NoticeKind};
pub use repository::KnowledgeClient;
