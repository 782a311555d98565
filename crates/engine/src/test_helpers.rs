//! Shared test helpers for engine tests.

use async_trait::async_trait;
use shanghan_core::error::ChatError;
use shanghan_core::message::ChatMessage;
use shanghan_core::ChatClient;
use std::sync::Mutex;

type Request = (Vec<ChatMessage>, Option<String>);

/// A chat client that returns scripted outcomes in order and records every
/// request it receives.
///
/// Panics if called more times than outcomes were scripted.
pub struct ScriptedClient {
    outcomes: Mutex<Vec<Result<String, ChatError>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedClient {
    pub fn new(outcomes: Vec<Result<String, ChatError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn failures(errors: Vec<ChatError>) -> Self {
        Self::new(errors.into_iter().map(Err).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The `n`th recorded request: messages and system prompt.
    pub fn request(&self, n: usize) -> Request {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> Result<String, ChatError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        requests.push((messages.to_vec(), system_prompt.map(str::to_string)));

        let outcomes = self.outcomes.lock().unwrap();
        match outcomes.get(call) {
            Some(outcome) => outcome.clone(),
            None => panic!(
                "ScriptedClient: no more outcomes (call #{call}, have {})",
                outcomes.len()
            ),
        }
    }
}
