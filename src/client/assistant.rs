//! Chat assistant controller
//!
//! Holds the in-memory transcript and runs one request-response turn at a
//! time: `Idle -> AwaitingReply -> Idle`. The whole transcript is sent on
//! every turn; nothing is persisted.

use super::functions::AiFunctions;
use crate::error::Result;
use crate::knowledge::ChatMessage;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingReply,
}

pub struct ChatAssistant {
    functions: Arc<dyn AiFunctions>,
    transcript: Vec<ChatMessage>,
    input: String,
    state: ChatState,
}

impl ChatAssistant {
    pub fn new(functions: Arc<dyn AiFunctions>) -> Self {
        Self {
            functions,
            transcript: Vec::new(),
            input: String::new(),
            state: ChatState::Idle,
        }
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ChatState::AwaitingReply
    }

    /// Start a turn from the current input.
    ///
    /// Appends the trimmed user message, clears the input and returns the
    /// transcript to send. `None` when the input is blank or a reply is
    /// already pending.
    pub fn begin_turn(&mut self) -> Option<Vec<ChatMessage>> {
        let text = self.input.trim();
        if text.is_empty() || self.is_loading() {
            return None;
        }
        self.transcript.push(ChatMessage::user(text));
        self.input.clear();
        self.state = ChatState::AwaitingReply;
        Some(self.transcript.clone())
    }

    /// Record the outcome of the pending turn
    pub fn finish_turn(&mut self, reply: Result<String>) {
        let message = match reply {
            Ok(content) => ChatMessage::assistant(content),
            Err(e) => {
                tracing::warn!("Chat turn failed: {}", e);
                ChatMessage::assistant(format!("Error: {}", e))
            }
        };
        self.transcript.push(message);
        self.state = ChatState::Idle;
    }

    /// Run a full turn. Returns false when nothing was sent.
    pub async fn submit(&mut self) -> bool {
        let Some(messages) = self.begin_turn() else {
            return false;
        };
        let reply = self.functions.chat(&messages).await;
        self.finish_turn(reply);
        true
    }
}
