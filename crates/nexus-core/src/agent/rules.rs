//! Project rules: extra system context attached to the conversation
//!
//! Rules reach the conversation four ways: always-apply rules at
//! construction, `@name` references in user input, glob matches against
//! files touched during a turn, and agent-profile scoping.

use serde::{Deserialize, Serialize};

use crate::tools::build_globset;

/// Rule file extension accepted in `@name.mdc` references
pub const RULE_EXTENSION: &str = ".mdc";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRule {
    /// File name without extension
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub always_apply: bool,
    /// Path globs that auto-attach the rule
    #[serde(default)]
    pub globs: Vec<String>,
    /// Agent-profile name globs the rule is scoped to
    #[serde(default)]
    pub agents: Vec<String>,
    pub content: String,
}

impl ProjectRule {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn always(mut self) -> Self {
        self.always_apply = true;
        self
    }

    pub fn with_globs<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globs = globs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agents = agents.into_iter().map(Into::into).collect();
        self
    }

    /// `name` or `name.mdc`
    pub fn is_named(&self, reference: &str) -> bool {
        reference == self.name
            || reference
                .strip_suffix(RULE_EXTENSION)
                .is_some_and(|stem| stem == self.name)
    }

    /// Whether any glob matches the `/`-normalized path
    pub fn matches_path(&self, path: &str) -> bool {
        if self.globs.is_empty() {
            return false;
        }
        let normalized = normalize_path(path);
        build_globset(&self.globs, true)
            .map(|set| set.is_match(normalized.as_str()))
            .unwrap_or(false)
    }

    pub fn applies_to_agent(&self, profile: &str) -> bool {
        if self.agents.is_empty() {
            return false;
        }
        build_globset(&self.agents, false)
            .map(|set| set.is_match(profile))
            .unwrap_or(false)
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.strip_prefix("./").map(str::to_string).unwrap_or(path)
}

fn is_ref_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Locate `@name` references: (start byte of `@`, end byte, name)
fn scan_refs(input: &str) -> Vec<(usize, usize, &str)> {
    let mut refs = Vec::new();
    let mut prev: Option<char> = None;
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '@' && prev.map_or(true, char::is_whitespace) {
            let start = i + 1;
            let mut end = start;
            while let Some(&(j, next)) = chars.peek() {
                if !is_ref_char(next) {
                    break;
                }
                end = j + next.len_utf8();
                chars.next();
            }
            let name = input[start..end].trim_end_matches('.');
            if !name.is_empty() {
                refs.push((i, start + name.len(), name));
            }
            prev = input[..end].chars().next_back();
            continue;
        }
        prev = Some(c);
    }
    refs
}

/// Names referenced as `@name` in the input
pub fn rule_refs(input: &str) -> Vec<String> {
    scan_refs(input).into_iter().map(|(_, _, name)| name.to_string()).collect()
}

/// Rules referenced by `@name`, and the input with those references removed
///
/// References that name no rule are left in the text.
pub fn find_manual_rules<'a>(rules: &'a [ProjectRule], input: &str) -> (Vec<&'a ProjectRule>, String) {
    let mut active: Vec<&ProjectRule> = Vec::new();
    let mut cleaned = String::with_capacity(input.len());
    let mut cursor = 0;

    for (start, end, name) in scan_refs(input) {
        let Some(rule) = rules.iter().find(|r| r.is_named(name)) else {
            continue;
        };
        if !active.iter().any(|r| r.name == rule.name) {
            active.push(rule);
        }
        cleaned.push_str(&input[cursor..start]);
        cursor = end;
        // swallow one following space so "a @r b" becomes "a b"
        if input[cursor..].starts_with(' ') {
            cursor += 1;
        }
    }
    cleaned.push_str(&input[cursor..]);

    if active.is_empty() {
        return (active, input.to_string());
    }
    (active, cleaned.trim().to_string())
}

/// Non-always rules whose globs match any touched path
pub fn auto_attach_rules<'a, S: AsRef<str>>(rules: &'a [ProjectRule], paths: &[S]) -> Vec<&'a ProjectRule> {
    if paths.is_empty() {
        return Vec::new();
    }
    rules
        .iter()
        .filter(|rule| !rule.always_apply)
        .filter(|rule| paths.iter().any(|p| rule.matches_path(p.as_ref())))
        .collect()
}

/// Rules scoped to an agent profile
pub fn agent_rules<'a>(rules: &'a [ProjectRule], profile: &str) -> Vec<&'a ProjectRule> {
    rules.iter().filter(|rule| rule.applies_to_agent(profile)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<ProjectRule> {
        vec![
            ProjectRule::new("style", "Use four spaces.").always(),
            ProjectRule::new("rust", "Prefer Result over panics.").with_globs(["src/**/*.rs", "*.toml"]),
            ProjectRule::new("docs", "Write in present tense.").with_globs(["docs/*.md"]),
            ProjectRule::new("review", "Be strict.").with_agents(["review*"]),
        ]
    }

    #[test]
    fn test_manual_refs() {
        let rules = rules();
        let (active, cleaned) = find_manual_rules(&rules, "@rust fix the build @docs.mdc please");
        let names: Vec<_> = active.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "docs"]);
        assert_eq!(cleaned, "fix the build please");
    }

    #[test]
    fn test_unknown_refs_and_emails_are_kept() {
        let rules = rules();
        let input = "mail me@example.com about @nothing";
        let (active, cleaned) = find_manual_rules(&rules, input);
        assert!(active.is_empty());
        assert_eq!(cleaned, input);
        assert_eq!(rule_refs("see @rust. and @docs"), vec!["rust", "docs"]);
    }

    fn attached(rules: &[ProjectRule], paths: &[&str]) -> Vec<String> {
        auto_attach_rules(rules, paths).iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_auto_attach() {
        let rules = rules();
        assert_eq!(attached(&rules, &["src/tools/gateway.rs"]), vec!["rust"]);
        assert_eq!(attached(&rules, &["./Cargo.toml", "docs\\Guide.MD"]), vec!["rust", "docs"]);
        assert!(attached(&rules, &["docs/nested/guide.md"]).is_empty());
        assert!(attached(&rules, &[]).is_empty());
    }

    #[test]
    fn test_agent_scoping() {
        let rules = rules();
        assert_eq!(agent_rules(&rules, "reviewer").len(), 1);
        assert!(agent_rules(&rules, "writer").is_empty());
    }
}
