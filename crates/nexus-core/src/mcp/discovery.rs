//! Discovered remote tools and the `mcp__<server>__<tool>` naming scheme

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::ToolSchema;

/// Reserved delimiter between namespace, server and tool
pub const NAME_DELIMITER: &str = "__";
/// Leading segment of every namespaced remote tool name
pub const NAMESPACE: &str = "mcp";

/// A tool as one server reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteToolSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl RemoteToolSpec {
    /// Read one entry of a tool listing; entries without a name are skipped
    ///
    /// The schema is taken from `inputSchema`, then `parameters`, then `schema`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let input_schema = ["inputSchema", "parameters", "schema"]
            .iter()
            .find_map(|key| value.get(*key).filter(|v| !v.is_null()))
            .cloned();
        Some(Self {
            name,
            description,
            input_schema,
        })
    }

    /// Normalize the listing shapes servers return: a bare array,
    /// `{tools: [...]}`, or `{result: {tools: [...]}}`
    pub fn parse_listing(result: &Value) -> Option<Vec<Self>> {
        let entries = match result {
            Value::Array(entries) => entries,
            Value::Object(map) => match map.get("tools") {
                Some(Value::Array(entries)) => entries,
                _ => map.get("result")?.get("tools")?.as_array()?,
            },
            _ => return None,
        };
        Some(entries.iter().filter_map(Self::from_value).collect())
    }
}

/// A tool available from a connected server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredTool {
    pub server: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl DiscoveredTool {
    pub fn new(server: impl Into<String>, spec: RemoteToolSpec) -> Self {
        Self {
            server: server.into(),
            name: spec.name,
            description: spec.description,
            input_schema: spec.input_schema,
        }
    }

    /// Name exposed to the model
    pub fn namespaced_name(&self) -> String {
        namespaced_name(&self.server, &self.name)
    }

    /// Function schema offered to the model, with fallbacks for a missing
    /// description or schema
    pub fn to_schema(&self) -> ToolSchema {
        let description = self
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("MCP tool {} from server {}", self.name, self.server));
        let parameters = self
            .input_schema
            .clone()
            .unwrap_or_else(|| json!({ "type": "object", "properties": {}, "required": [] }));
        ToolSchema::function(self.namespaced_name(), description, parameters)
    }
}

pub fn namespaced_name(server: &str, tool: &str) -> String {
    format!("{NAMESPACE}{NAME_DELIMITER}{server}{NAME_DELIMITER}{tool}")
}

/// Whether a tool name uses the remote namespace at all
pub fn is_namespaced(name: &str) -> bool {
    name.strip_prefix(NAMESPACE)
        .is_some_and(|rest| rest.starts_with(NAME_DELIMITER))
}

/// Split `mcp__<server>__<tool>` into server and tool
///
/// The server is the second segment; the tool is everything after it, so a
/// tool's own name may contain `__`. Returns `None` when either part is
/// missing or empty.
pub fn split_namespaced(name: &str) -> Option<(String, String)> {
    let mut parts = name.split(NAME_DELIMITER);
    if parts.next()? != NAMESPACE {
        return None;
    }
    let server = parts.next()?;
    let tool = parts.collect::<Vec<_>>().join(NAME_DELIMITER);
    if server.is_empty() || tool.is_empty() {
        return None;
    }
    Some((server.to_string(), tool))
}
