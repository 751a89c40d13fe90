//! Agent profiles: named presets for model, prompt and tool scope

use serde::{Deserialize, Serialize};

use crate::tools::ToolFilter;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Replaces the base system prompt when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub tools_include: Vec<String>,
    #[serde(default)]
    pub tools_exclude: Vec<String>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tools(mut self, include: &[&str], exclude: &[&str]) -> Self {
        self.tools_include = include.iter().map(|s| s.to_string()).collect();
        self.tools_exclude = exclude.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Tool filter for this profile's include/exclude patterns
    pub fn tool_filter(&self) -> Result<ToolFilter, globset::Error> {
        ToolFilter::new()
            .with_include(self.tools_include.iter().cloned())?
            .with_exclude(self.tools_exclude.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_filter() {
        let profile = AgentProfile::new("reviewer").with_tools(&["read_*", "mcp__fs__*"], &["*delete*"]);
        let filter = profile.tool_filter().unwrap();
        assert!(filter.matches("read_file"));
        assert!(filter.matches("mcp__fs__list_dir"));
        assert!(!filter.matches("mcp__fs__delete_path"));
        assert!(!filter.matches("execute_command"));

        assert!(AgentProfile::new("plain").tool_filter().unwrap().is_unrestricted());
    }

    #[test]
    fn test_yaml_shape() {
        let profile: AgentProfile = serde_yaml::from_str(
            "name: reviewer\nmodel: gpt-4o\ntemperature: 0.2\ntools_include: [read_file]\n",
        )
        .unwrap();
        assert_eq!(profile.model.as_deref(), Some("gpt-4o"));
        assert_eq!(profile.tools_include, vec!["read_file"]);
        assert!(profile.system.is_none());
    }
}
