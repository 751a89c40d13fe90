//! Remote tool server configuration
//!
//! The server list is a JSON array (YAML when the file ends in `.yaml` or
//! `.yml`) of `{name, command, args?, cwd?, env?}` entries. Entries are
//! validated one by one; an invalid entry is dropped and reported, the
//! rest still load.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::discovery::{namespaced_name, split_namespaced, NAME_DELIMITER};
use super::error::{McpError, McpResult};

/// How to launch one remote tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteServerConfig {
    /// Unique identity; must not contain `__`
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Added on top of the parent environment
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl RemoteServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Check the entry on its own (uniqueness is checked by the set)
    pub fn validate(&self) -> McpResult<()> {
        if self.name.trim().is_empty() {
            return Err(McpError::InvalidConfig("server name is empty".to_string()));
        }
        if self.name.contains(NAME_DELIMITER) {
            return Err(McpError::InvalidConfig(format!(
                "server name '{}' contains the reserved delimiter '{}'",
                self.name, NAME_DELIMITER
            )));
        }
        // A trailing '_' would merge into the delimiter and shift the split
        let routed = split_namespaced(&namespaced_name(&self.name, "tool"));
        if !routed.is_some_and(|(server, tool)| server == self.name && tool == "tool") {
            return Err(McpError::InvalidConfig(format!(
                "server name '{}' does not round-trip through '{}'-namespaced tool names",
                self.name, NAME_DELIMITER
            )));
        }
        if self.command.trim().is_empty() {
            return Err(McpError::InvalidConfig(format!("server '{}' has no command", self.name)));
        }
        Ok(())
    }
}

/// The validated server list plus whatever was rejected while loading it
#[derive(Debug, Clone, Default)]
pub struct ServerConfigSet {
    pub servers: Vec<RemoteServerConfig>,
    pub issues: Vec<String>,
}

impl ServerConfigSet {
    /// Validate entries, keeping the first of any duplicate names
    pub fn from_entries(entries: Vec<RemoteServerConfig>) -> Self {
        let mut set = ServerConfigSet::default();
        let mut seen = HashSet::new();
        for entry in entries {
            if let Err(e) = entry.validate() {
                set.issues.push(e.to_string());
                continue;
            }
            if !seen.insert(entry.name.clone()) {
                set.issues.push(format!("duplicate server name '{}' ignored", entry.name));
                continue;
            }
            set.servers.push(entry);
        }
        set
    }

    /// Load a server list; a missing file is an empty list
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => return Self::with_issue(format!("failed to read {}: {}", path.display(), e)),
        };
        match parse_entries(path, &content) {
            Ok(raw) => {
                let mut issues = Vec::new();
                let entries = raw
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, value)| match serde_json::from_value::<RemoteServerConfig>(value) {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            issues.push(format!("entry {} in {} is invalid: {}", index, path.display(), e));
                            None
                        }
                    })
                    .collect();
                let mut set = Self::from_entries(entries);
                issues.append(&mut set.issues);
                set.issues = issues;
                set
            }
            Err(message) => Self::with_issue(message),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RemoteServerConfig> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.servers.iter().map(|s| s.name.clone()).collect()
    }

    fn with_issue(issue: String) -> Self {
        Self {
            servers: Vec::new(),
            issues: vec![issue],
        }
    }
}

fn parse_entries(path: &Path, content: &str) -> Result<Vec<Value>, String> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed: Result<Value, String> = if is_yaml {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(content).map_err(|e| e.to_string())
    };
    match parsed {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(_) => Err(format!("{} must contain an array of servers", path.display())),
        Err(e) => Err(format!("failed to parse {}: {}", path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_json_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mcp.servers.json");
        fs::write(
            &path,
            r#"[
                {"name": "fs", "command": "fs-server", "args": ["--root", "."], "env": {"DEBUG": "1"}},
                {"name": "git", "command": "git-mcp", "cwd": "/tmp"}
            ]"#,
        )
        .unwrap();

        let set = ServerConfigSet::load(&path);
        assert!(set.issues.is_empty());
        assert_eq!(set.names(), vec!["fs", "git"]);
        assert_eq!(set.get("fs").unwrap().args, vec!["--root", "."]);
        assert_eq!(set.get("fs").unwrap().env["DEBUG"], "1");
        assert_eq!(set.get("git").unwrap().cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_invalid_entries_are_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mcp.servers.json");
        fs::write(
            &path,
            r#"[
                {"name": "a__b", "command": "x"},
                {"name": "fs_", "command": "x"},
                {"name": "ok", "command": "x"},
                {"name": "ok", "command": "y"},
                {"name": "nocmd", "command": ""},
                {"command": "missing-name"}
            ]"#,
        )
        .unwrap();

        let set = ServerConfigSet::load(&path);
        assert_eq!(set.names(), vec!["ok"]);
        assert_eq!(set.get("ok").unwrap().command, "x");
        assert_eq!(set.issues.len(), 5);
        assert!(set.issues.iter().any(|i| i.contains("a__b")));
        assert!(set.issues.iter().any(|i| i.contains("'fs_'")));
    }

    #[test]
    fn test_name_must_round_trip_through_namespace() {
        assert!(RemoteServerConfig::new("_fs", "x").validate().is_ok());
        assert!(RemoteServerConfig::new("my_fs", "x").validate().is_ok());
        assert!(RemoteServerConfig::new("fs_", "x").validate().is_err());
        assert!(RemoteServerConfig::new("a__b", "x").validate().is_err());
    }

    #[test]
    fn test_yaml_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers.yaml");
        fs::write(&path, "- name: fs\n  command: fs-server\n  args: [\"-v\"]\n").unwrap();

        let set = ServerConfigSet::load(&path);
        assert_eq!(set.names(), vec!["fs"]);
        assert_eq!(set.servers[0].args, vec!["-v"]);
    }

    #[test]
    fn test_missing_and_broken_files() {
        let dir = tempdir().unwrap();
        let missing = ServerConfigSet::load(&dir.path().join("none.json"));
        assert!(missing.servers.is_empty() && missing.issues.is_empty());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();
        let set = ServerConfigSet::load(&broken);
        assert!(set.servers.is_empty());
        assert_eq!(set.issues.len(), 1);

        let object = dir.path().join("object.json");
        fs::write(&object, r#"{"name": "fs"}"#).unwrap();
        assert!(ServerConfigSet::load(&object).issues[0].contains("array"));
    }
}
