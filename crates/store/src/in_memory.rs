//! In-memory sinks for tests and ephemeral runs.

use async_trait::async_trait;
use shanghan_core::error::StoreError;
use shanghan_core::sink::{ConversationRecord, ConversationSink, FeedbackRecord, FeedbackSink};
use tokio::sync::RwLock;

/// Feedback kept in a vector, keyed by position.
#[derive(Default)]
pub struct InMemoryFeedbackSink {
    records: RwLock<Vec<FeedbackRecord>>,
}

impl InMemoryFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackSink for InMemoryFeedbackSink {
    async fn write_feedback(&self, record: FeedbackRecord) -> Result<String, StoreError> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(format!("feedback_{}", records.len()))
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }
}

/// Conversations kept by (session id, day); a re-save on the same day replaces.
#[derive(Default)]
pub struct InMemoryConversationSink {
    records: RwLock<Vec<ConversationRecord>>,
}

impl InMemoryConversationSink {
    pub fn new() -> Self {
        Self::default()
    }
}

fn day_key(record: &ConversationRecord) -> String {
    format!("{}_{}", record.session_id, record.timestamp.format("%Y-%m-%d"))
}

#[async_trait]
impl ConversationSink for InMemoryConversationSink {
    async fn save_conversation(&self, record: ConversationRecord) -> Result<String, StoreError> {
        let key = day_key(&record);
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| day_key(r) == key) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(format!("conversation_{key}"))
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationRecord>, StoreError> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn load_conversation(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.session_id == session_id)
            .max_by_key(|r| r.timestamp)
            .cloned())
    }
}
