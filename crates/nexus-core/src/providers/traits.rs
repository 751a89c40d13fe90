//! Completion provider capability and the chat-completions request/response shapes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ProviderResult;
use crate::types::{CancellationToken, Message, ToolCall, ToolChoice, ToolSchema};

/// One chat completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            tool_choice: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Offer tools to the model; `tool_choice` is `auto` whenever tools are present
    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tool_choice = if tools.is_empty() { None } else { Some(ToolChoice::Auto) };
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The assistant message inside a choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Reasoning text some models return alongside the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl AssistantMessage {
    /// Tool calls, treating an empty list as none
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting for one completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One chat completion response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// A final answer with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_message(
            AssistantMessage {
                content: Some(content.into()),
                ..Default::default()
            },
            "stop",
        )
    }

    /// A response requesting the given tool calls
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self::from_message(
            AssistantMessage {
                content: None,
                tool_calls: Some(calls),
                reasoning: None,
            },
            "tool_calls",
        )
    }

    pub fn from_message(message: AssistantMessage, finish_reason: &str) -> Self {
        Self {
            choices: vec![Choice {
                message,
                finish_reason: Some(finish_reason.to_string()),
            }],
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// The first choice, which is the only one the agent reads
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }
}

/// A chat-completions capable model endpoint
///
/// Implementations must return promptly with `ProviderError::Cancelled`
/// once `cancel` fires.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name used in errors and logs (e.g. "openai", "groq")
    fn name(&self) -> &str;

    async fn create_chat_completion(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> ProviderResult<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_omits_empty_tools() {
        let request = CompletionRequest::new("gpt-4o-mini", vec![Message::user("hi")]).with_max_tokens(8000);
        let body = serde_json::to_value(&request).unwrap();

        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("temperature").is_none());
        assert_eq!(body["max_tokens"], 8000);
    }

    #[test]
    fn test_request_body_with_tools() {
        let tools = vec![ToolSchema::function("list_files", "List", ToolSchema::empty_parameters())];
        let request = CompletionRequest::new("m", Vec::new()).with_tools(tools);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["function"]["name"], "list_files");
    }

    #[test]
    fn test_response_parsing() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "read_file", "arguments": "{\"file_path\":\"a.rs\"}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        }))
        .unwrap();

        let choice = response.first_choice().unwrap();
        assert_eq!(choice.message.tool_calls()[0].name, "read_file");
        assert_eq!(choice.message.content(), "");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }
}
