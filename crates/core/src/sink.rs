//! Persistence sinks for feedback and archived conversations.
//!
//! The chat pipeline only needs "write object" and "read object" against
//! these; the storage format belongs to the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::message::ConversationTurn;

/// A user's rating of one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// The `msg_<n>` identifier of the rated answer
    #[serde(default)]
    pub message_id: Option<String>,

    /// Free-form rating value sent by the client (thumbs, stars, ...)
    #[serde(default)]
    pub rating: Option<serde_json::Value>,

    /// Optional comment
    #[serde(default)]
    pub feedback: String,

    pub timestamp: DateTime<Utc>,

    pub user_email: String,
}

/// A session's conversation, archived when the user logs out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub session_id: String,
    pub user_email: String,
    pub timestamp: DateTime<Utc>,
    pub messages: Vec<ConversationTurn>,
}

/// Append-only store for feedback submissions.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Persist one submission, returning the key it was stored under.
    async fn write_feedback(&self, record: FeedbackRecord) -> std::result::Result<String, StoreError>;

    /// All stored submissions.
    async fn list_feedback(&self) -> std::result::Result<Vec<FeedbackRecord>, StoreError>;
}

/// Store for archived conversations, keyed by session and day.
#[async_trait]
pub trait ConversationSink: Send + Sync {
    /// Persist (or overwrite) a session's conversation, returning its key.
    async fn save_conversation(
        &self,
        record: ConversationRecord,
    ) -> std::result::Result<String, StoreError>;

    /// All archived conversations.
    async fn list_conversations(&self) -> std::result::Result<Vec<ConversationRecord>, StoreError>;

    /// The archived conversation for a session, if any.
    async fn load_conversation(
        &self,
        session_id: &str,
    ) -> std::result::Result<Option<ConversationRecord>, StoreError>;
}
