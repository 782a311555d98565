//! # Shanghan Core
//!
//! Domain types, traits, and error definitions for the Shang Han Lun chat
//! service. This crate has **no framework dependencies**: it defines the
//! model that the knowledge, provider, engine, store, and gateway crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the chat pipeline is a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping the completion backend or the persistence sinks via configuration
//! - Testing the engine and the HTTP layer with scripted stand-ins
//! - A clean dependency graph (all crates depend inward on core)

pub mod auth;
pub mod chat;
pub mod error;
pub mod message;
pub mod session;
pub mod sink;
pub mod text;

// Re-export key types at crate root for ergonomics
pub use auth::CredentialStore;
pub use chat::ChatClient;
pub use error::{ChatError, Error, Result, StoreError};
pub use message::{AnswerResult, ChatMessage, ConversationTurn, Role};
pub use session::{Session, SessionHandle, SessionStore};
pub use sink::{ConversationRecord, ConversationSink, FeedbackRecord, FeedbackSink};
pub use text::truncate_chars;
