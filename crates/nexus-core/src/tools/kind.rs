//! Tool-kind resolution
//!
//! Every model-issued tool name is resolved exactly once, at the gateway
//! boundary, into a [`ResolvedTool`]. Later stages match on the variant
//! instead of comparing name strings.

use serde::Deserialize;
use serde_json::Value;

use crate::mcp::{is_namespaced, split_namespaced};

/// Prefix some models put in front of the real tool name
pub const HALLUCINATED_PREFIX: &str = "repo_browser.";

/// Built-in local tools the runtime knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    ReadFile,
    CreateFile,
    EditFile,
    DeleteFile,
    ListFiles,
    SearchFiles,
    ExecuteCommand,
    CreateTasks,
    UpdateTasks,
}

impl BuiltinTool {
    pub const ALL: [BuiltinTool; 9] = [
        BuiltinTool::ReadFile,
        BuiltinTool::CreateFile,
        BuiltinTool::EditFile,
        BuiltinTool::DeleteFile,
        BuiltinTool::ListFiles,
        BuiltinTool::SearchFiles,
        BuiltinTool::ExecuteCommand,
        BuiltinTool::CreateTasks,
        BuiltinTool::UpdateTasks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinTool::ReadFile => "read_file",
            BuiltinTool::CreateFile => "create_file",
            BuiltinTool::EditFile => "edit_file",
            BuiltinTool::DeleteFile => "delete_file",
            BuiltinTool::ListFiles => "list_files",
            BuiltinTool::SearchFiles => "search_files",
            BuiltinTool::ExecuteCommand => "execute_command",
            BuiltinTool::CreateTasks => "create_tasks",
            BuiltinTool::UpdateTasks => "update_tasks",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

impl std::fmt::Display for BuiltinTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Path arguments shared by the file tools
///
/// `read_file`, `edit_file` and friends take `file_path`; directory tools
/// take `directory`. Anything else in the argument object is ignored here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathArgs {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
}

impl PathArgs {
    /// Extract path arguments; non-object or mistyped arguments yield none
    pub fn from_value(arguments: &Value) -> Self {
        serde_json::from_value(arguments.clone()).unwrap_or_default()
    }

    /// The path a call touches, preferring `file_path`
    pub fn touched(&self) -> Option<&str> {
        [self.file_path.as_deref(), self.directory.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|p| !p.is_empty())
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// A tool name after normalization and routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTool {
    /// Registered in the local tool registry
    Local { name: String, builtin: Option<BuiltinTool> },
    /// `mcp__<server>__<tool>` routed to a remote server
    Remote { server: String, tool: String },
    /// Uses the remote namespace but cannot be split into server and tool
    InvalidRemote { name: String },
    /// Neither remote nor registered locally
    Unknown { name: String },
}

impl ResolvedTool {
    /// Resolve a normalized name; `is_local` answers registry membership
    pub fn resolve(name: &str, is_local: impl Fn(&str) -> bool) -> Self {
        if is_namespaced(name) {
            return match split_namespaced(name) {
                Some((server, tool)) => ResolvedTool::Remote { server, tool },
                None => ResolvedTool::InvalidRemote { name: name.to_string() },
            };
        }
        if is_local(name) {
            ResolvedTool::Local {
                name: name.to_string(),
                builtin: BuiltinTool::from_name(name),
            }
        } else {
            ResolvedTool::Unknown { name: name.to_string() }
        }
    }

    pub fn builtin(&self) -> Option<BuiltinTool> {
        match self {
            ResolvedTool::Local { builtin, .. } => *builtin,
            _ => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ResolvedTool::Remote { .. })
    }
}

/// Strip the hallucinated prefix and surrounding whitespace
pub fn normalize_tool_name(raw: &str) -> &str {
    let name = raw.trim();
    name.strip_prefix(HALLUCINATED_PREFIX).unwrap_or(name)
}
