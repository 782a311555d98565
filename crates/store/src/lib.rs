//! # Shanghan Store
//!
//! Session state and the persistence sinks behind the HTTP layer.
//!
//! Backends:
//! - **Sessions**: bounded in-memory store (sessions end with the process)
//! - **Sinks** (`file`): one JSON document per feedback submission or
//!   archived conversation under the configured data directory
//! - **Sinks** (`memory`): vectors, for tests and ephemeral runs

pub mod file_sink;
pub mod in_memory;
pub mod session;

pub use file_sink::{FileConversationSink, FileFeedbackSink, is_valid_session_id};
pub use in_memory::{InMemoryConversationSink, InMemoryFeedbackSink};
pub use session::InMemorySessionStore;

use std::sync::Arc;

use shanghan_core::sink::{ConversationSink, FeedbackSink};

/// The sink pair used by the gateway.
pub struct Sinks {
    pub feedback: Arc<dyn FeedbackSink>,
    pub conversations: Arc<dyn ConversationSink>,
}

/// Build the sinks selected by `storage.backend`.
pub fn build_sinks(storage: &shanghan_config::StorageConfig) -> Sinks {
    match storage.backend.as_str() {
        "memory" => {
            tracing::info!("Using in-memory feedback and conversation sinks");
            Sinks {
                feedback: Arc::new(InMemoryFeedbackSink::new()),
                conversations: Arc::new(InMemoryConversationSink::new()),
            }
        }
        _ => {
            tracing::info!(dir = %storage.data_dir, "Using file feedback and conversation sinks");
            Sinks {
                feedback: Arc::new(FileFeedbackSink::new(storage.feedback_dir())),
                conversations: Arc::new(FileConversationSink::new(storage.conversations_dir())),
            }
        }
    }
}
