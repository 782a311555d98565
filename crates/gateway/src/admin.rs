//! Admin endpoints: archived conversations, feedback, the audit trail and
//! recent log lines.

use std::path::{Path, PathBuf};

use axum::{
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shanghan_core::{ConversationRecord, FeedbackRecord};
use shanghan_security::{AuditEntry, AuditOutcome};
use tracing::{error, warn};

use crate::{ApiError, SharedState, api_error};

/// Log files written by the binary start with this name.
pub const LOG_FILE_PREFIX: &str = "shanghan.log";

/// Lines returned by the logs endpoint.
pub const LOG_TAIL_LINES: usize = 1_000;

#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub session_id: String,
    pub user_email: String,
    pub timestamp: DateTime<Utc>,
    pub message_count: usize,
}

impl From<&ConversationRecord> for ConversationSummary {
    fn from(record: &ConversationRecord) -> Self {
        Self {
            session_id: record.session_id.clone(),
            user_email: record.user_email.clone(),
            timestamp: record.timestamp,
            message_count: record.messages.len(),
        }
    }
}

#[derive(Serialize)]
pub struct ConversationList {
    conversations: Vec<ConversationSummary>,
}

#[derive(Serialize)]
pub struct FeedbackList {
    feedbacks: Vec<FeedbackRecord>,
}

#[derive(Serialize)]
pub struct AuditList {
    entries: Vec<AuditEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    outcome: Option<AuditOutcome>,
}

#[derive(Serialize)]
pub struct LogList {
    logs: Vec<LogLine>,
}

/// One log line; structured when it parses as a JSON log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LogLine {
    Parsed {
        timestamp: String,
        level: String,
        target: String,
        message: String,
    },
    Raw {
        raw: String,
    },
}

fn storage_failure(what: &str, e: impl std::fmt::Display) -> ApiError {
    error!(error = %e, "Failed to read {what}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("Failed to read {what}"))
}

pub async fn conversations(State(state): State<SharedState>) -> Result<Json<ConversationList>, ApiError> {
    let records = state
        .conversations
        .list_conversations()
        .await
        .map_err(|e| storage_failure("conversations", e))?;
    Ok(Json(ConversationList {
        conversations: records.iter().map(ConversationSummary::from).collect(),
    }))
}

pub async fn conversation(
    State(state): State<SharedState>,
    UrlPath(session_id): UrlPath<String>,
) -> Result<Json<ConversationRecord>, ApiError> {
    state
        .conversations
        .load_conversation(&session_id)
        .await
        .map_err(|e| storage_failure("conversation", e))?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Conversation not found"))
}

pub async fn feedback(State(state): State<SharedState>) -> Result<Json<FeedbackList>, ApiError> {
    let feedbacks = state
        .feedback
        .list_feedback()
        .await
        .map_err(|e| storage_failure("feedback", e))?;
    Ok(Json(FeedbackList { feedbacks }))
}

/// Recent audit entries, newest first. `?outcome=denied` (or `success`,
/// `failure`) narrows the list.
pub async fn audit(
    State(state): State<SharedState>,
    Query(query): Query<AuditQuery>,
) -> Json<AuditList> {
    let mut entries = match &query.outcome {
        Some(outcome) => state.audit.entries_by_outcome(outcome),
        None => state.audit.entries(),
    };
    entries.reverse();
    Json(AuditList { entries })
}

pub async fn logs(State(state): State<SharedState>) -> Result<Json<LogList>, ApiError> {
    let Some(dir) = state.log_dir.as_deref() else {
        return Ok(Json(LogList { logs: Vec::new() }));
    };
    let logs = read_recent_logs(dir, LOG_TAIL_LINES)
        .await
        .map_err(|e| storage_failure("logs", e))?;
    Ok(Json(LogList { logs }))
}

/// The most recent `shanghan.log*` file in `dir`, by name.
async fn latest_log_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut latest: Option<String> = None;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(LOG_FILE_PREFIX) && latest.as_ref().is_none_or(|l| name > *l) {
            latest = Some(name);
        }
    }
    Ok(latest.map(|name| dir.join(name)))
}

/// Last `limit` lines of the latest log file, oldest first.
pub async fn read_recent_logs(dir: &Path, limit: usize) -> std::io::Result<Vec<LogLine>> {
    let Some(path) = latest_log_file(dir).await? else {
        return Ok(Vec::new());
    };
    let bytes = tokio::fs::read(&path).await?;
    let content = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(limit);
    if lines.len() > limit {
        warn!(file = %path.display(), skipped = start, "Log file truncated to most recent lines");
    }
    Ok(lines[start..].iter().map(|line| parse_log_line(line)).collect())
}

/// Parse a `tracing-subscriber` JSON event line.
pub fn parse_log_line(line: &str) -> LogLine {
    let line = line.trim();
    let parsed = serde_json::from_str::<serde_json::Value>(line).ok().and_then(|value| {
        let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(String::from);
        let message = value
            .get("fields")
            .and_then(|f| f.get("message"))
            .and_then(|m| m.as_str())
            .map(String::from)
            .or_else(|| field("message"))?;
        Some(LogLine::Parsed {
            timestamp: field("timestamp")?,
            level: field("level")?,
            target: field("target").unwrap_or_default(),
            message,
        })
    });
    parsed.unwrap_or_else(|| LogLine::Raw { raw: line.to_string() })
}
