//! Error types for the chat service domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for chat service operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion API errors ---
    #[error("Chat client error: {0}")]
    Chat(#[from] ChatError),

    // --- Session / sink errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Classified failures of the external completion API.
///
/// The variants map one-to-one onto the recovery policy applied by the chat
/// engine: `NotConfigured`, `RateLimited` and `Transport` fall back to canned
/// answers, `InvalidCredentials` surfaces a configuration message, and `Api`
/// surfaces an apology carrying the error text.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("API key not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid API key: {0}")]
    InvalidCredentials(String),

    #[error("Rate limited by the API after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("API error (status {status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("API timeout/connection failure after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },
}

impl ChatError {
    /// Whether the failure is a transient one that the client already retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transport { .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record could not be encoded: {0}")]
    Encoding(String),
}
