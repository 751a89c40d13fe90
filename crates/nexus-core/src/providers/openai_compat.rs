//! OpenAI-compatible chat completions over HTTP
//!
//! Serves both OpenAI (or any server speaking the same API, via
//! `OPENAI_BASE_URL`) and Groq's OpenAI-compatible endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::error::{ProviderError, ProviderResult};
use super::traits::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::logging::{file_logger as log, Logger};
use crate::types::CancellationToken;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

pub struct OpenAiCompatibleProvider {
    name: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            name: name.into(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            logger,
        }
    }

    /// Apply a whole-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> ProviderResult<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    async fn send(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let url = self.endpoint();
        log::debug(
            "providers::openai_compat",
            &format!("POST {} model={} messages={}", url, request.model, request.messages.len()),
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(ProviderError::from_status(&self.name, status.as_u16(), message));
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::invalid_response(&self.name, e.to_string()))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_chat_completion(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> ProviderResult<CompletionResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.logger.debug(&format!("[{}] Completion request cancelled", self.name));
                Err(ProviderError::Cancelled)
            }
            result = self.send(&request) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::Message;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP request with a canned response; yields the request body
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let request_body = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length {
                        break text[end + 4..end + 4 + length].to_string();
                    }
                }
                if n == 0 {
                    break String::new();
                }
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request_body
        });
        (format!("http://{}/v1", addr), handle)
    }

    fn provider(base: &str) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new("openai", base, "sk-test", Arc::new(NoOpLogger))
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"hi there"},"finish_reason":"stop"}]}"#,
        )
        .await;

        let request = CompletionRequest::new("gpt-4o-mini", vec![Message::user("hello")]);
        let response = provider(&base)
            .create_chat_completion(request, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.first_choice().unwrap().message.content(), "hi there");
        let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["model"], "gpt-4o-mini");
        assert_eq!(sent["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn test_401_maps_to_unauthorized() {
        let (base, _server) = serve_once("401 Unauthorized", r#"{"error":{"message":"bad key"}}"#).await;

        let err = provider(&base)
            .create_chat_completion(CompletionRequest::new("m", Vec::new()), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = provider("http://127.0.0.1:9/v1")
            .create_chat_completion(CompletionRequest::new("m", Vec::new()), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }

    #[test]
    fn test_endpoint_trims_slash() {
        assert_eq!(provider("https://api.groq.com/openai/v1/").endpoint(), "https://api.groq.com/openai/v1/chat/completions");
    }
}
