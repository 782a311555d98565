//! The chat engine: context, prompt, completion, recovery.
//!
//! `process_query` never fails. Completion errors are turned into a
//! well-formed answer according to their kind:
//!
//! | Error                 | Answer                               |
//! |-----------------------|--------------------------------------|
//! | not configured        | fallback responder                   |
//! | rate limited, transport | fallback responder                 |
//! | invalid credentials   | configuration message                |
//! | other API error       | apology carrying the error text      |

use std::sync::Arc;

use shanghan_core::error::ChatError;
use shanghan_core::message::{AnswerResult, ChatMessage, ConversationTurn};
use shanghan_core::ChatClient;
use shanghan_knowledge::{ContextBuilder, KnowledgeStore};
use tracing::{debug, error, info, warn};

use crate::fallback::FallbackResponder;
use crate::prompt::{build_user_prompt, compose_messages};

/// Source attached to configuration-error answers.
pub const CONFIGURATION_ERROR_SOURCE: &str = "Configuration Error";

/// Source attached to apology answers.
pub const ERROR_SOURCE: &str = "Error";

/// A query ready to send: outbound messages plus the citations they rest on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    pub messages: Vec<ChatMessage>,
    pub sources: Vec<String>,
}

/// Answers questions by grounding them in the knowledge store and asking
/// the completion client.
pub struct ChatEngine {
    client: Arc<dyn ChatClient>,
    context: ContextBuilder,
    fallback: FallbackResponder,
    system_prompt: String,
}

impl ChatEngine {
    pub fn new(client: Arc<dyn ChatClient>, knowledge: KnowledgeStore) -> Self {
        info!(client = client.name(), model = client.model(), "ChatEngine initialized");
        Self {
            client,
            context: ContextBuilder::new(knowledge),
            fallback: FallbackResponder::new(),
            system_prompt: knowledge.system_prompt().to_string(),
        }
    }

    /// Replace the persona sent as the system message.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn client(&self) -> &Arc<dyn ChatClient> {
        &self.client
    }

    /// Build the outbound messages for `query` given the prior `history`.
    pub fn prepare(&self, query: &str, history: &[ConversationTurn]) -> PreparedQuery {
        let context = self.context.build(query);
        let prompt = build_user_prompt(&context.text, query);
        PreparedQuery {
            messages: compose_messages(history, &prompt),
            sources: context.sources,
        }
    }

    /// Answer `query`, surfacing completion errors to the caller.
    pub async fn try_process_query(
        &self,
        query: &str,
        history: &[ConversationTurn],
    ) -> Result<AnswerResult, ChatError> {
        let prepared = self.prepare(query, history);
        debug!(
            messages = prepared.messages.len(),
            sources = ?prepared.sources,
            "Sending query to completion client"
        );

        let answer = self
            .client
            .chat(&prepared.messages, Some(&self.system_prompt))
            .await?;
        info!(chars = answer.chars().count(), "Query processed successfully");
        Ok(AnswerResult::new(answer, prepared.sources))
    }

    /// Answer `query`; always yields a well-formed answer.
    pub async fn process_query(&self, query: &str, history: &[ConversationTurn]) -> AnswerResult {
        info!(
            query = %shanghan_core::truncate_chars(query, 100),
            history = history.len(),
            "Processing query"
        );
        match self.try_process_query(query, history).await {
            Ok(answer) => answer,
            Err(e) => self.recover(query, &e),
        }
    }

    /// Map a completion failure onto the answer the caller receives.
    pub fn recover(&self, query: &str, err: &ChatError) -> AnswerResult {
        match err {
            ChatError::NotConfigured(_) => {
                warn!("No API key; using fallback responder");
                self.fallback.respond(query)
            }
            ChatError::RateLimited { .. } | ChatError::Transport { .. } => {
                warn!(error = %err, "Completion API unavailable; using fallback responder");
                self.fallback.respond(query)
            }
            ChatError::InvalidCredentials(msg) => {
                error!(error = %err, "Completion API rejected the key");
                AnswerResult::new(
                    format!("API key error: {msg}. Please check your DEEPSEEK_API_KEY."),
                    vec![CONFIGURATION_ERROR_SOURCE.to_string()],
                )
            }
            ChatError::Api { .. } => {
                error!(error = %err, "Error processing query");
                AnswerResult::new(
                    format!(
                        "I apologize, but I encountered an error processing your query: {err}. Please ensure the DeepSeek API key is properly configured."
                    ),
                    vec![ERROR_SOURCE.to_string()],
                )
            }
        }
    }
}
