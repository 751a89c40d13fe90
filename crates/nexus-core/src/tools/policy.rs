//! Approval policy
//!
//! Tools fall into three classes. Dangerous tools prompt on every call,
//! approval-required tools prompt until the user enables session
//! auto-approve, unrestricted tools never prompt.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::kind::{BuiltinTool, ResolvedTool};
use crate::mcp::namespaced_name;

/// Safety classification of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolClass {
    Unrestricted,
    ApprovalRequired,
    Dangerous,
}

/// Answer to an approval prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    /// Skip prompts for approval-required tools for the rest of the session
    #[serde(rename = "autoApproveSession", default)]
    pub auto_approve_session: bool,
}

impl ApprovalDecision {
    pub fn approve() -> Self {
        Self {
            approved: true,
            auto_approve_session: false,
        }
    }

    pub fn approve_for_session() -> Self {
        Self {
            approved: true,
            auto_approve_session: true,
        }
    }

    pub fn reject() -> Self {
        Self::default()
    }
}

/// Interactive approval capability
///
/// Implementations suspend until the user answers. The gateway abandons
/// the wait if the turn is interrupted.
#[async_trait]
pub trait Approver: Send + Sync {
    async fn request_approval(&self, tool_name: &str, arguments: &Value) -> ApprovalDecision;
}

/// What a call needs before it may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalRequirement {
    NotNeeded,
    /// Approval-required tool covered by session auto-approve
    AutoApproved,
    Prompt,
}

/// Maps resolved tools to their class
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    overrides: HashMap<String, ToolClass>,
    remote_default: ToolClass,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalPolicy {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            remote_default: ToolClass::ApprovalRequired,
        }
    }

    /// Pin the class of one tool name (local name or `mcp__server__tool`)
    pub fn with_class(mut self, name: impl Into<String>, class: ToolClass) -> Self {
        self.overrides.insert(name.into(), class);
        self
    }

    /// Class for remote tools without an override
    pub fn with_remote_default(mut self, class: ToolClass) -> Self {
        self.remote_default = class;
        self
    }

    /// Default class of a built-in tool
    pub fn builtin_class(tool: BuiltinTool) -> ToolClass {
        match tool {
            BuiltinTool::DeleteFile | BuiltinTool::ExecuteCommand => ToolClass::Dangerous,
            BuiltinTool::CreateFile | BuiltinTool::EditFile => ToolClass::ApprovalRequired,
            _ => ToolClass::Unrestricted,
        }
    }

    pub fn classify(&self, tool: &ResolvedTool) -> ToolClass {
        match tool {
            ResolvedTool::Local { name, builtin } => self
                .overrides
                .get(name)
                .copied()
                .or_else(|| builtin.map(Self::builtin_class))
                .unwrap_or(ToolClass::Unrestricted),
            ResolvedTool::Remote { server, tool } => self
                .overrides
                .get(&namespaced_name(server, tool))
                .copied()
                .unwrap_or(self.remote_default),
            ResolvedTool::InvalidRemote { .. } | ResolvedTool::Unknown { .. } => ToolClass::Unrestricted,
        }
    }

    /// Session auto-approve never covers dangerous tools
    pub fn requirement(class: ToolClass, session_auto_approve: bool) -> ApprovalRequirement {
        match class {
            ToolClass::Unrestricted => ApprovalRequirement::NotNeeded,
            ToolClass::ApprovalRequired if session_auto_approve => ApprovalRequirement::AutoApproved,
            ToolClass::ApprovalRequired | ToolClass::Dangerous => ApprovalRequirement::Prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(name: &str) -> ResolvedTool {
        ResolvedTool::Local {
            name: name.to_string(),
            builtin: BuiltinTool::from_name(name),
        }
    }

    #[test]
    fn test_builtin_classes() {
        let policy = ApprovalPolicy::new();
        assert_eq!(policy.classify(&local("execute_command")), ToolClass::Dangerous);
        assert_eq!(policy.classify(&local("delete_file")), ToolClass::Dangerous);
        assert_eq!(policy.classify(&local("edit_file")), ToolClass::ApprovalRequired);
        assert_eq!(policy.classify(&local("create_file")), ToolClass::ApprovalRequired);
        assert_eq!(policy.classify(&local("read_file")), ToolClass::Unrestricted);
        assert_eq!(policy.classify(&local("my_tool")), ToolClass::Unrestricted);
    }

    #[test]
    fn test_remote_default_and_overrides() {
        let remote = ResolvedTool::Remote {
            server: "fs".to_string(),
            tool: "list_dir".to_string(),
        };
        assert_eq!(ApprovalPolicy::new().classify(&remote), ToolClass::ApprovalRequired);

        let policy = ApprovalPolicy::new()
            .with_class("mcp__fs__list_dir", ToolClass::Unrestricted)
            .with_class("my_tool", ToolClass::Dangerous);
        assert_eq!(policy.classify(&remote), ToolClass::Unrestricted);
        assert_eq!(policy.classify(&local("my_tool")), ToolClass::Dangerous);
    }

    #[test]
    fn test_dangerous_ignores_session_auto_approve() {
        assert_eq!(
            ApprovalPolicy::requirement(ToolClass::Dangerous, true),
            ApprovalRequirement::Prompt
        );
        assert_eq!(
            ApprovalPolicy::requirement(ToolClass::ApprovalRequired, true),
            ApprovalRequirement::AutoApproved
        );
        assert_eq!(
            ApprovalPolicy::requirement(ToolClass::ApprovalRequired, false),
            ApprovalRequirement::Prompt
        );
        assert_eq!(
            ApprovalPolicy::requirement(ToolClass::Unrestricted, false),
            ApprovalRequirement::NotNeeded
        );
    }

    #[test]
    fn test_decision_wire_shape() {
        let decision: ApprovalDecision =
            serde_json::from_str(r#"{"approved":true,"autoApproveSession":true}"#).unwrap();
        assert_eq!(decision, ApprovalDecision::approve_for_session());

        let decision: ApprovalDecision = serde_json::from_str(r#"{"approved":false}"#).unwrap();
        assert_eq!(decision, ApprovalDecision::reject());
    }
}
