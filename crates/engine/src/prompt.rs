//! Prompt assembly and history windowing.

use shanghan_core::message::{ChatMessage, ConversationTurn};
use shanghan_core::text::truncate_chars;

/// Most recent history entries forwarded upstream.
pub const HISTORY_WINDOW: usize = 10;

/// Per-entry character cap for forwarded history.
pub const HISTORY_CHARS: usize = 500;

/// Character cap for the composed prompt.
pub const PROMPT_CHARS: usize = 4000;

/// Wrap the query and its grounding context in answering instructions.
pub fn build_user_prompt(context: &str, query: &str) -> String {
    format!(
        "Context from Shang Han Lun:\n\n{context}\n\nQuestion: {query}\n\nInstructions:\n\
         - Keep answer SHORT (2-4 sentences)\n\
         - Use **bold** for formula names\n\
         - Use ## for sections\n\
         - Include key dosages and indications\n\
         - Focus on most relevant information only"
    )
}

/// The outbound conversation: the tail of `history` (user and assistant
/// turns only, each capped) followed by the capped prompt.
pub fn compose_messages(history: &[ConversationTurn], prompt: &str) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages: Vec<ChatMessage> = history[start..]
        .iter()
        .filter(|turn| turn.role.is_conversational())
        .map(|turn| ChatMessage::new(turn.role, truncate_chars(&turn.content, HISTORY_CHARS)))
        .collect();
    messages.push(ChatMessage::user(truncate_chars(prompt, PROMPT_CHARS)));
    messages
}
