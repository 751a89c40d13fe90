//! Configuration: workspace paths and agent settings
//!
//! The remote tool server list lives with the protocol client in
//! [`crate::mcp::config`].

mod error;
pub mod paths;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{AgentSettings, SettingsFile, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
