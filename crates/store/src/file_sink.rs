//! JSON-file sinks for feedback and archived conversations.
//!
//! One pretty-printed JSON document per file:
//!
//! - feedback: `feedback_<YYYYmmdd_HHMMSS>_<userhash>.json`, created
//!   exclusively; a numeric suffix is added when the name is taken
//! - conversations: `conversation_<session_id>_<YYYY-mm-dd>.json`,
//!   overwritten when the same session is archived again that day

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shanghan_core::error::StoreError;
use shanghan_core::sink::{ConversationRecord, ConversationSink, FeedbackRecord, FeedbackSink};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const MAX_NAME_COLLISIONS: u32 = 1_000;

/// Session ids are used in file names, so only plain identifiers are accepted.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to create {}: {e}", dir.display())))
}

/// Read every `<prefix>*.json` document in `dir`, skipping unreadable ones.
async fn read_documents<T: serde::de::DeserializeOwned>(
    dir: &Path,
    prefix: &str,
) -> Result<Vec<(String, T)>, StoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StoreError::Storage(format!(
                "Failed to read {}: {e}",
                dir.display()
            )));
        }
    };

    let mut documents = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(prefix) || !name.ends_with(".json") {
            continue;
        }
        let content = match tokio::fs::read_to_string(entry.path()).await {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %name, error = %e, "Skipping unreadable record");
                continue;
            }
        };
        match serde_json::from_str::<T>(&content) {
            Ok(doc) => documents.push((name, doc)),
            Err(e) => warn!(file = %name, error = %e, "Skipping corrupted record"),
        }
    }
    Ok(documents)
}

/// Feedback sink writing one JSON file per submission.
pub struct FileFeedbackSink {
    dir: PathBuf,
}

impl FileFeedbackSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FeedbackSink for FileFeedbackSink {
    async fn write_feedback(&self, record: FeedbackRecord) -> Result<String, StoreError> {
        ensure_dir(&self.dir).await?;
        let stem = format!(
            "feedback_{}_{}",
            record.timestamp.format("%Y%m%d_%H%M%S"),
            shanghan_security::user_hash(&record.user_email)
        );
        let body = serde_json::to_vec_pretty(&record)
            .map_err(|e| StoreError::Encoding(e.to_string()))?;

        for n in 0..MAX_NAME_COLLISIONS {
            let name = if n == 0 {
                format!("{stem}.json")
            } else {
                format!("{stem}_{n}.json")
            };
            let path = self.dir.join(&name);
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match file {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StoreError::Storage(format!("Failed to create {name}: {e}")));
                }
            };
            file.write_all(&body)
                .await
                .map_err(|e| StoreError::Storage(format!("Failed to write {name}: {e}")))?;
            file.flush()
                .await
                .map_err(|e| StoreError::Storage(format!("Failed to write {name}: {e}")))?;

            info!(file = %name, "Feedback saved");
            return Ok(name);
        }

        Err(StoreError::Storage(format!(
            "No free file name for {stem} after {MAX_NAME_COLLISIONS} attempts"
        )))
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        let mut records: Vec<FeedbackRecord> = read_documents(&self.dir, "feedback_")
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .collect();
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(records)
    }
}

/// Conversation sink writing one JSON file per session and day.
pub struct FileConversationSink {
    dir: PathBuf,
}

impl FileConversationSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ConversationSink for FileConversationSink {
    async fn save_conversation(&self, record: ConversationRecord) -> Result<String, StoreError> {
        if !is_valid_session_id(&record.session_id) {
            return Err(StoreError::Storage(format!(
                "Refusing to archive invalid session id '{}'",
                record.session_id
            )));
        }
        ensure_dir(&self.dir).await?;

        let name = format!(
            "conversation_{}_{}.json",
            record.session_id,
            record.timestamp.format("%Y-%m-%d")
        );
        let body = serde_json::to_vec_pretty(&record)
            .map_err(|e| StoreError::Encoding(e.to_string()))?;
        tokio::fs::write(self.dir.join(&name), body)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to write {name}: {e}")))?;

        info!(file = %name, messages = record.messages.len(), "Conversation archived");
        Ok(name)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationRecord>, StoreError> {
        let mut records: Vec<ConversationRecord> = read_documents(&self.dir, "conversation_")
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn load_conversation(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationRecord>, StoreError> {
        if !is_valid_session_id(session_id) {
            debug!(session = %session_id, "Rejected invalid session id lookup");
            return Ok(None);
        }
        let prefix = format!("conversation_{session_id}_");
        let latest = read_documents::<ConversationRecord>(&self.dir, &prefix)
            .await?
            .into_iter()
            .filter(|(_, record)| record.session_id == session_id)
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, record)| record);
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shanghan_core::message::ConversationTurn;

    fn feedback(user: &str) -> FeedbackRecord {
        FeedbackRecord {
            message_id: Some("msg_2".into()),
            rating: Some(serde_json::json!("up")),
            feedback: "Clear answer".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            user_email: user.into(),
        }
    }

    fn conversation(session_id: &str, day: u32) -> ConversationRecord {
        ConversationRecord {
            session_id: session_id.into(),
            user_email: "regular@tcm.org".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            messages: vec![
                ConversationTurn::user("What is Bai Hu Tang?"),
                ConversationTurn::assistant("Clears Yangming heat.", vec!["Shang Han Lun - Bai Hu Tang".into()]),
            ],
        }
    }

    #[tokio::test]
    async fn feedback_file_name_uses_timestamp_and_user_hash() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileFeedbackSink::new(dir.path().join("feedback"));

        let key = sink.write_feedback(feedback("prof@tcm.org")).await.unwrap();
        let hash = shanghan_security::user_hash("prof@tcm.org");
        assert_eq!(key, format!("feedback_20260314_092653_{hash}.json"));

        let stored = std::fs::read_to_string(sink.dir().join(&key)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(value["message_id"], "msg_2");
        assert_eq!(value["rating"], "up");
        assert_eq!(value["user_email"], "prof@tcm.org");
    }

    #[tokio::test]
    async fn same_second_submissions_do_not_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileFeedbackSink::new(dir.path());

        let first = sink.write_feedback(feedback("prof@tcm.org")).await.unwrap();
        let second = sink.write_feedback(feedback("prof@tcm.org")).await.unwrap();
        assert_ne!(first, second);
        assert!(second.ends_with("_1.json"));
        assert_eq!(sink.list_feedback().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn listing_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileFeedbackSink::new(dir.path().join("never-created"));
        assert!(sink.list_feedback().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupted_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileFeedbackSink::new(dir.path());
        sink.write_feedback(feedback("prof@tcm.org")).await.unwrap();
        std::fs::write(dir.path().join("feedback_broken.json"), "{not json").unwrap();

        assert_eq!(sink.list_feedback().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn conversation_saved_per_session_and_day() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileConversationSink::new(dir.path());

        let key = sink.save_conversation(conversation("abc123", 14)).await.unwrap();
        assert_eq!(key, "conversation_abc123_2026-03-14.json");

        // Same day overwrites.
        let mut again = conversation("abc123", 14);
        again.messages.push(ConversationTurn::user("And Cheng Qi Tang?"));
        sink.save_conversation(again).await.unwrap();

        let all = sink.list_conversations().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].messages.len(), 3);
    }

    #[tokio::test]
    async fn load_returns_latest_day() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileConversationSink::new(dir.path());
        sink.save_conversation(conversation("abc123", 14)).await.unwrap();
        let mut later = conversation("abc123", 15);
        later.messages.truncate(1);
        sink.save_conversation(later).await.unwrap();

        let loaded = sink.load_conversation("abc123").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert!(sink.load_conversation("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn path_like_session_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileConversationSink::new(dir.path());

        assert!(sink.load_conversation("../secrets").await.unwrap().is_none());
        assert!(sink.save_conversation(conversation("../x", 14)).await.is_err());
    }

    #[test]
    fn session_id_validation() {
        assert!(is_valid_session_id("0f8e2c9a4b7d4e1f9a3c5b6d7e8f9a0b"));
        assert!(is_valid_session_id("session-1_a"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("a/b"));
        assert!(!is_valid_session_id("*"));
    }
}
