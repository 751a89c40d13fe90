//! Include/exclude filter over tool names
//!
//! Used by agent profiles to scope which tools the model is offered.
//! Patterns are case-insensitive globs (`*`, `?`, `[..]`).

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Compile patterns into one case-insensitive set
///
/// With `literal_separator`, `*` stops at `/` and only `**` crosses it.
pub(crate) fn build_globset<I, S>(patterns: I, literal_separator: bool) -> Result<GlobSet, globset::Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            GlobBuilder::new(pattern.as_ref().trim())
                .case_insensitive(true)
                .literal_separator(literal_separator)
                .build()?,
        );
    }
    builder.build()
}

/// Filter for the tools offered to the model
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    /// If set, only names matching one of these are kept
    include: Option<GlobSet>,
    /// Names matching any of these are dropped
    exclude: Option<GlobSet>,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl ToolFilter {
    /// Filter that keeps everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only tools matching these patterns; an empty list changes nothing
    pub fn with_include<I, S>(mut self, patterns: I) -> Result<Self, globset::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = clean(patterns);
        self.include = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(&patterns, false)?)
        };
        self.include_patterns = patterns;
        Ok(self)
    }

    /// Drop tools matching these patterns
    pub fn with_exclude<I, S>(mut self, patterns: I) -> Result<Self, globset::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = clean(patterns);
        self.exclude = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(&patterns, false)?)
        };
        self.exclude_patterns = patterns;
        Ok(self)
    }

    /// Check if a tool name passes this filter
    pub fn matches(&self, name: &str) -> bool {
        if let Some(ref include) = self.include {
            if !include.is_match(name) {
                return false;
            }
        }
        if let Some(ref exclude) = self.exclude {
            if exclude.is_match(name) {
                return false;
            }
        }
        true
    }

    pub fn is_unrestricted(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }
}

fn clean<I, S>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    patterns
        .into_iter()
        .map(Into::into)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_filter_default() {
        let filter = ToolFilter::new();
        assert!(filter.is_unrestricted());
        assert!(filter.matches("read_file"));
        assert!(filter.matches("mcp__fs__list_dir"));
    }

    #[test]
    fn test_tool_filter_include() {
        let filter = ToolFilter::new().with_include(["mcp__fs__*", "read_?ile"]).unwrap();
        assert!(filter.matches("mcp__fs__list_dir"));
        assert!(filter.matches("MCP__FS__LIST_DIR"));
        assert!(filter.matches("read_file"));
        assert!(!filter.matches("mcp__github__create_issue"));
        assert!(!filter.matches("execute_command"));
    }

    #[test]
    fn test_tool_filter_exclude_wins() {
        let filter = ToolFilter::new()
            .with_include(["mcp__*"])
            .unwrap()
            .with_exclude(["*delete*"])
            .unwrap();
        assert!(filter.matches("mcp__fs__list_dir"));
        assert!(!filter.matches("mcp__fs__delete_path"));
        assert_eq!(filter.exclude_patterns(), ["*delete*"]);
    }

    #[test]
    fn test_empty_patterns_are_ignored() {
        let filter = ToolFilter::new().with_include(["", "  "]).unwrap();
        assert!(filter.is_unrestricted());
        assert!(ToolFilter::new().with_include(["a[b"]).is_err());
    }

    #[test]
    fn test_path_globset() {
        let set = build_globset(["src/*.rs", "docs/**/*.md"], true).unwrap();
        assert!(set.is_match("src/lib.rs"));
        assert!(!set.is_match("src/nested/lib.rs"));
        assert!(set.is_match("docs/a/b/Guide.MD"));
    }
}
