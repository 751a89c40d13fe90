//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Function definition offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the input parameters
    pub parameters: Value,
}

/// Tool definition in chat-completions form: `{type: "function", function: {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSchema,
}

impl ToolSchema {
    /// Create a function tool definition
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionSchema {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Parameter schema accepting any object
    pub fn empty_parameters() -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Tool call requested by the model
///
/// `arguments` is the JSON-encoded argument object exactly as the provider
/// sent it. It may be truncated; callers parse it with [`ToolCall::parse_arguments`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireToolCall", into = "WireToolCall")]
pub struct ToolCall {
    /// Provider-assigned identifier, unique within one assistant turn
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Raw JSON argument text
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Create a tool call from an already-structured argument value
    pub fn with_value(id: impl Into<String>, name: impl Into<String>, arguments: &Value) -> Self {
        Self::new(id, name, arguments.to_string())
    }

    /// Parse the argument text; an empty string means no arguments
    pub fn parse_arguments(&self) -> Result<Value, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.arguments)
    }
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn function_kind() -> String {
    "function".to_string()
}

impl From<WireToolCall> for ToolCall {
    fn from(wire: WireToolCall) -> Self {
        // Some OpenAI-compatible servers send the arguments as an object
        let arguments = match wire.function.arguments {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Self {
            id: wire.id,
            name: wire.function.name,
            arguments,
        }
    }
}

impl From<ToolCall> for WireToolCall {
    fn from(call: ToolCall) -> Self {
        Self {
            id: call.id,
            kind: function_kind(),
            function: WireFunction {
                name: call.name,
                arguments: Value::String(call.arguments),
            },
        }
    }
}

/// Outcome of one tool execution, returned to the model as the tool message body
///
/// Exactly one of `content` / `error` is meaningful depending on `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set only when the user declined the call
    #[serde(rename = "userRejected", default, skip_serializing_if = "std::ops::Not::not")]
    pub user_rejected: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(content: impl Into<Value>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            message: None,
            error: None,
            user_rejected: false,
        }
    }

    /// Create a successful result that only carries a status message
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            content: None,
            message: Some(message.into()),
            error: None,
            user_rejected: false,
        }
    }

    /// Attach a human-readable status message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Create a failed tool result
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            message: None,
            error: Some(error.into()),
            user_rejected: false,
        }
    }

    /// Create a result for a call the user declined
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            user_rejected: true,
            ..Self::failure(error)
        }
    }

    /// Serialize for the tool message body
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"unserializable tool result: {}"}}"#, e)
        })
    }
}

/// Tool choice option for requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to use tools
    #[default]
    Auto,
    /// Don't use tools
    None,
    /// Force tool use
    Required,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_schema_shape() {
        let tool = ToolSchema::function(
            "read_file",
            "Read a file",
            json!({
                "type": "object",
                "properties": { "file_path": { "type": "string" } },
                "required": ["file_path"]
            }),
        );

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "read_file");
        assert_eq!(tool.name(), "read_file");
    }

    #[test]
    fn test_tool_call_parse_arguments() {
        let call = ToolCall::new("call_123", "read_file", r#"{"file_path":"src/main.rs"}"#);
        assert_eq!(call.parse_arguments().unwrap()["file_path"], "src/main.rs");

        let truncated = ToolCall::new("call_124", "create_file", r#"{"file_path":"a.rs","content":"fn ma"#);
        assert!(truncated.parse_arguments().is_err());

        let empty = ToolCall::new("call_125", "list_files", "");
        assert!(empty.parse_arguments().unwrap().is_object());
    }

    #[test]
    fn test_tool_call_accepts_object_arguments() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "call_1",
            "type": "function",
            "function": { "name": "list_files", "arguments": { "directory": "src" } }
        }))
        .unwrap();

        assert_eq!(call.parse_arguments().unwrap()["directory"], "src");
    }

    #[test]
    fn test_tool_result_body() {
        let ok = ToolResult::success("72F, sunny");
        assert_eq!(ok.to_message_content(), r#"{"success":true,"content":"72F, sunny"}"#);

        let rejected = ToolResult::rejected("Tool execution canceled by user");
        let value: Value = serde_json::from_str(&rejected.to_message_content()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["userRejected"], true);

        let failed = ToolResult::failure("boom");
        assert!(!failed.to_message_content().contains("userRejected"));
    }
}
