//! ChatClient trait: the abstraction over the remote completion API.
//!
//! A client knows how to deliver role-tagged messages plus an optional system
//! prompt to a completion endpoint and return the generated text, reporting
//! failures as classified [`ChatError`]s.

use async_trait::async_trait;
use crate::error::ChatError;
use crate::message::ChatMessage;

/// The core ChatClient trait.
///
/// The chat engine calls `chat()` without knowing which backend answers.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// A human-readable name for this client (e.g., "deepseek").
    fn name(&self) -> &str;

    /// The model identifier requests are sent with.
    fn model(&self) -> &str;

    /// Send the messages and return the first completion's text.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> std::result::Result<String, ChatError>;
}
