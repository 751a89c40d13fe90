//! Workspace path resolution
//!
//! Defaults:
//! - nexus root: `.nexus` under the working directory (`NEXUS_ROOT` overrides)
//! - remote server config: `<nexus root>/mcp.servers.json`

use std::env;
use std::path::{Path, PathBuf};

/// Files or directories whose presence marks a project root
const PROJECT_MARKERS: &[&str] = &[".git", "package.json", "Cargo.toml", "tsconfig.json", ".nexus"];

fn current_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Read a path override from the environment; relative values resolve
/// against the working directory
fn env_path(name: &str) -> Option<PathBuf> {
    let value = env::var(name).ok()?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let path = PathBuf::from(value);
    Some(if path.is_absolute() { path } else { current_dir().join(path) })
}

pub fn nexus_root() -> PathBuf {
    env_path("NEXUS_ROOT").unwrap_or_else(|| current_dir().join(".nexus"))
}

/// Location of the remote tool server list
pub fn mcp_servers_file() -> PathBuf {
    nexus_root().join("mcp.servers.json")
}

/// Workspace-level settings file
pub fn workspace_settings_file() -> PathBuf {
    nexus_root().join("config.yaml")
}

/// User-level settings file (`~/.config/nexus/config.yaml` on Linux)
pub fn user_settings_file() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
    config_dir.join("nexus").join("config.yaml")
}

fn has_project_marker(dir: &Path) -> bool {
    PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists())
}

/// Find the project root by walking up from `start`
///
/// `NEXUS_PROJECT_ROOT` wins when set. Otherwise the nearest ancestor
/// holding a project marker is returned, or `start` itself if none does.
pub fn detect_project_root(start: impl AsRef<Path>) -> PathBuf {
    if let Some(root) = env_path("NEXUS_PROJECT_ROOT") {
        return root;
    }
    find_marked_ancestor(start.as_ref())
}

fn find_marked_ancestor(start: &Path) -> PathBuf {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        current_dir().join(start)
    };
    start
        .ancestors()
        .find(|dir| has_project_marker(dir))
        .map(Path::to_path_buf)
        .unwrap_or(start)
}

/// Resolve a possibly relative path against the project root
pub fn resolve_at_project_root(root: impl AsRef<Path>, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.as_os_str().is_empty() || path.is_absolute() {
        return path.to_path_buf();
    }
    root.as_ref().join(path)
}
