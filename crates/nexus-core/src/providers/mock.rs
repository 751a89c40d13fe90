//! Scripted provider for tests
//!
//! Replies are consumed in order; once the script is exhausted the provider
//! echoes the last user message as a final answer. Every request is recorded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::credentials::{Credentials, ProviderFactory};
use super::error::{ProviderError, ProviderResult};
use super::traits::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::logging::{Logger, NoOpLogger};
use crate::types::{CancellationToken, Role, ToolCall};

/// One scripted reply
#[derive(Debug)]
pub enum MockReply {
    Response(CompletionResponse),
    Error(ProviderError),
    /// Return the response after a delay (still cancellable)
    Delayed(Duration, CompletionResponse),
    /// Never answer; only returns once cancelled
    Hang,
}

pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    logger: Arc<dyn Logger>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(Arc::new(NoOpLogger))
    }
}

impl MockProvider {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.script.lock().push_back(reply);
        self
    }

    /// Queue a final text answer
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.with_reply(MockReply::Response(CompletionResponse::text(text)))
    }

    /// Queue a tool-call response
    pub fn then_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.with_reply(MockReply::Response(CompletionResponse::tool_calls(calls)))
    }

    pub fn then_error(self, error: ProviderError) -> Self {
        self.with_reply(MockReply::Error(error))
    }

    pub fn then_hang(self) -> Self {
        self.with_reply(MockReply::Hang)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn echo(request: &CompletionRequest) -> CompletionResponse {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string());
        CompletionResponse::text(format!("Echo: {}", last_user))
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_chat_completion(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> ProviderResult<CompletionResponse> {
        self.requests.lock().push(request.clone());
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let reply = self.script.lock().pop_front();
        self.logger.debug(&format!(
            "MockProvider: request #{} ({} scripted replies left)",
            self.request_count(),
            self.script.lock().len()
        ));

        match reply {
            None => Ok(Self::echo(&request)),
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Error(error)) => Err(error),
            Some(MockReply::Delayed(delay, response)) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                    _ = tokio::time::sleep(delay) => Ok(response),
                }
            }
            Some(MockReply::Hang) => {
                cancel.cancelled().await;
                Err(ProviderError::Cancelled)
            }
        }
    }
}

/// Factory that always hands out the same provider and remembers the
/// credentials it was asked to use
pub struct StaticProviderFactory {
    provider: Arc<dyn CompletionProvider>,
    seen: Mutex<Vec<Credentials>>,
}

impl StaticProviderFactory {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn created_with(&self) -> Vec<Credentials> {
        self.seen.lock().clone()
    }
}

impl ProviderFactory for StaticProviderFactory {
    fn create(
        &self,
        credentials: &Credentials,
        _logger: Arc<dyn Logger>,
    ) -> ProviderResult<Arc<dyn CompletionProvider>> {
        self.seen.lock().push(credentials.clone());
        Ok(Arc::clone(&self.provider))
    }
}
