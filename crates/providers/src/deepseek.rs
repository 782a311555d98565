//! DeepSeek chat completions client.
//!
//! Speaks the OpenAI-compatible `/v1/chat/completions` endpoint. Transient
//! failures (HTTP 429, timeouts, dropped connections) are retried with
//! exponential backoff; everything else is classified and returned at once.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shanghan_core::error::ChatError;
use shanghan_core::message::{ChatMessage, Role};
use shanghan_core::text::truncate_chars;
use tracing::{debug, error, info, warn};

use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const SYSTEM_PROMPT_CHARS: usize = 100;
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

/// Client for the DeepSeek completion API.
pub struct DeepSeekClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl DeepSeekClient {
    /// Create a client with default endpoint, model, timeout and retry policy.
    ///
    /// A missing or blank key is accepted here; every call then fails with
    /// [`ChatError::NotConfigured`] before touching the network.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            client: reqwest::Client::new(),
        }
    }

    /// Build a client from the application config.
    pub fn from_config(config: &shanghan_config::AppConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_base_url(&config.api_url)
            .with_model(&config.model)
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_retry_policy(RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.backoff_base_ms),
            ))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Per-attempt request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Assemble the outbound message list: the capped system prompt (if any)
    /// followed by the caller's messages.
    fn to_api_messages(messages: &[ChatMessage], system_prompt: Option<&str>) -> Vec<ApiMessage> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        if let Some(prompt) = system_prompt.filter(|p| !p.is_empty()) {
            out.push(ApiMessage {
                role: Role::System.as_str().to_string(),
                content: Some(format!("{}...", truncate_chars(prompt, SYSTEM_PROMPT_CHARS))),
            });
        }
        out.extend(messages.iter().map(|m| ApiMessage {
            role: m.role.as_str().to_string(),
            content: Some(m.content.clone()),
        }));
        out
    }

    /// Decode the first choice out of a 200 response body.
    fn parse_success(body: &[u8]) -> Result<String, ChatError> {
        let api_response: ApiResponse =
            serde_json::from_slice(body).map_err(|e| ChatError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChatError::Api {
                status_code: 200,
                message: "No choices in response".into(),
            })
    }

    /// Record a transient failure of the zero-based `attempt` and sleep
    /// before the next one, if any.
    async fn transient_failure(&self, attempt: u32, err: &reqwest::Error) -> ChatError {
        warn!(
            attempt = attempt + 1,
            max_attempts = self.retry.max_attempts,
            error = %err,
            "Request timeout/connection failure"
        );
        if self.retry.has_next(attempt) {
            let wait = self.retry.delay_for(attempt);
            info!(wait_ms = wait.as_millis() as u64, "Retrying after backoff");
            tokio::time::sleep(wait).await;
        }
        ChatError::Transport {
            attempts: attempt + 1,
            message: err.to_string(),
        }
    }
}

/// Whether another attempt could succeed. Request construction, redirect
/// and decode errors are final.
fn is_transient(err: &reqwest::Error) -> bool {
    !(err.is_builder() || err.is_redirect() || err.is_decode())
}

/// Mask an API key for logging: first 8 and last 4 characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[async_trait]
impl shanghan_core::ChatClient for DeepSeekClient {
    fn name(&self) -> &str {
        "deepseek"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> std::result::Result<String, ChatError> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("DeepSeek API key not configured");
            return Err(ChatError::NotConfigured(
                "DeepSeek API key not configured".into(),
            ));
        };

        let url = format!("{}{}", self.base_url, COMPLETIONS_PATH);
        let body = ApiRequest {
            model: &self.model,
            messages: Self::to_api_messages(messages, system_prompt),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(
            model = %self.model,
            messages = body.messages.len(),
            key = %mask_key(api_key),
            "Sending completion request"
        );

        let max_attempts = self.retry.max_attempts;
        let mut last_error = ChatError::Transport {
            attempts: 0,
            message: "no attempt made".into(),
        };

        for attempt in 0..max_attempts {
            debug!(attempt = attempt + 1, max_attempts, "API attempt");

            let sent = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) if is_transient(&e) => {
                    last_error = self.transient_failure(attempt, &e).await;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "Request failed");
                    return Err(ChatError::Transport {
                        attempts: attempt + 1,
                        message: e.to_string(),
                    });
                }
            };

            let status = response.status().as_u16();

            if status == 401 {
                error!("API authentication failed - invalid key");
                return Err(ChatError::InvalidCredentials(
                    "key rejected by the API (HTTP 401)".into(),
                ));
            }

            if status == 429 {
                last_error = ChatError::RateLimited {
                    attempts: attempt + 1,
                };
                if self.retry.has_next(attempt) {
                    let wait = self.retry.delay_for(attempt);
                    warn!(wait_ms = wait.as_millis() as u64, "Rate limited (429), backing off");
                    tokio::time::sleep(wait).await;
                } else {
                    warn!(attempts = attempt + 1, "Rate limited (429), retry budget exhausted");
                }
                continue;
            }

            if status != 200 {
                let error_body = response.text().await.unwrap_or_default();
                error!(status, body = %truncate_chars(&error_body, 200), "API returned error");
                return Err(ChatError::Api {
                    status_code: status,
                    message: error_body,
                });
            }

            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    last_error = self.transient_failure(attempt, &e).await;
                    continue;
                }
            };

            let content = Self::parse_success(&body)?;
            info!(chars = content.chars().count(), "API request successful");
            return Ok(content);
        }

        Err(last_error)
    }
}

/// Send a one-line question to verify key, endpoint and model.
pub async fn test_connection(
    client: &dyn shanghan_core::ChatClient,
) -> std::result::Result<String, ChatError> {
    client
        .chat(
            &[ChatMessage::user("What is Gui Zhi Tang?")],
            Some("You are a helpful TCM assistant."),
        )
        .await
}

// --- OpenAI-compatible API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
