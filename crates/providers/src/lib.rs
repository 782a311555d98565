//! Completion API clients for the chat service.
//!
//! All clients implement the `shanghan_core::ChatClient` trait. The engine
//! only ever sees the trait; the binary builds the concrete client from
//! configuration.

pub mod deepseek;
pub mod retry;

pub use deepseek::{DeepSeekClient, mask_key, test_connection};
pub use retry::RetryPolicy;

use std::sync::Arc;

/// Build the configured completion client.
pub fn build_from_config(config: &shanghan_config::AppConfig) -> Arc<dyn shanghan_core::ChatClient> {
    let client = DeepSeekClient::from_config(config);
    if client.is_configured() {
        tracing::info!(model = %config.model, url = %config.api_url, "DeepSeek client ready");
    } else {
        tracing::warn!("No DeepSeek API key configured; answers will come from the fallback responder");
    }
    Arc::new(client)
}
