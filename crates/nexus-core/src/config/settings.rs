//! Agent settings (YAML)
//!
//! Read from the user-level file, then the workspace-level file; any field
//! present at workspace level overrides the user value.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::paths;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Effective settings for one agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    pub max_iterations: usize,
    pub system_prompt: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: None,
            request_timeout_ms: None,
        }
    }
}

/// One settings file; every field optional so layers can be merged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl SettingsFile {
    /// Load one file; a missing file is an empty layer
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay `other` on top of `self`
    pub fn merge(self, other: SettingsFile) -> SettingsFile {
        SettingsFile {
            model: other.model.or(self.model),
            temperature: other.temperature.or(self.temperature),
            max_tokens: other.max_tokens.or(self.max_tokens),
            max_iterations: other.max_iterations.or(self.max_iterations),
            system_prompt: other.system_prompt.or(self.system_prompt),
            request_timeout_ms: other.request_timeout_ms.or(self.request_timeout_ms),
        }
    }
}

impl From<SettingsFile> for AgentSettings {
    fn from(file: SettingsFile) -> Self {
        let defaults = AgentSettings::default();
        AgentSettings {
            model: file.model.filter(|m| !m.trim().is_empty()).unwrap_or(defaults.model),
            temperature: file.temperature,
            max_tokens: file.max_tokens.unwrap_or(defaults.max_tokens),
            max_iterations: file
                .max_iterations
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_iterations),
            system_prompt: file.system_prompt,
            request_timeout_ms: file.request_timeout_ms,
        }
    }
}

impl AgentSettings {
    /// Merge the given user and workspace files
    pub fn load_from(user: &Path, workspace: &Path) -> ConfigResult<Self> {
        let merged = SettingsFile::load(user)?.merge(SettingsFile::load(workspace)?);
        Ok(merged.into())
    }

    /// Merge the default user and workspace files
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&paths::user_settings_file(), &paths::workspace_settings_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = tempdir().unwrap();
        let settings =
            AgentSettings::load_from(&dir.path().join("a.yaml"), &dir.path().join("b.yaml")).unwrap();
        assert_eq!(settings, AgentSettings::default());
        assert_eq!(settings.max_iterations, 50);
        assert_eq!(settings.max_tokens, 8000);
    }

    #[test]
    fn test_workspace_overrides_user() {
        let dir = tempdir().unwrap();
        let user = dir.path().join("user.yaml");
        let workspace = dir.path().join("workspace.yaml");
        fs::write(&user, "model: llama-3.3-70b\ntemperature: 0.2\nmax_iterations: 10\n").unwrap();
        fs::write(&workspace, "max_iterations: 20\nsystem_prompt: be brief\n").unwrap();

        let settings = AgentSettings::load_from(&user, &workspace).unwrap();
        assert_eq!(settings.model, "llama-3.3-70b");
        assert_eq!(settings.temperature, Some(0.2));
        assert_eq!(settings.max_iterations, 20);
        assert_eq!(settings.system_prompt.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempdir().unwrap();
        let user = dir.path().join("user.yaml");
        fs::write(&user, "model: [unclosed").unwrap();

        let err = AgentSettings::load_from(&user, &dir.path().join("none.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
