//! # Shanghan Engine
//!
//! Turns a question plus conversation history into an answer with
//! citations. Context comes from `shanghan-knowledge`, generation from any
//! `shanghan_core::ChatClient`, and canned answers from the
//! [`FallbackResponder`] when generation is unavailable.

pub mod engine;
pub mod fallback;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::{CONFIGURATION_ERROR_SOURCE, ChatEngine, ERROR_SOURCE, PreparedQuery};
pub use fallback::{FallbackResponder, FallbackTopic};
pub use prompt::{HISTORY_CHARS, HISTORY_WINDOW, PROMPT_CHARS, build_user_prompt, compose_messages};
