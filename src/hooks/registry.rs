//! Hook configuration model: definitions, matcher rules, per-event registry.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::HookEvent;

/// Reserved command meaning "ask the user interactively" instead of running
/// a subprocess. Produced by the legacy `"confirm"` config value.
pub const CONFIRM_COMMAND: &str = "__confirm__";

/// What a hook does when its rule fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    /// Run a shell command.
    #[default]
    Command,
    /// Inject static prompt text as a message.
    Prompt,
}

pub const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 30;

/// A single configured hook action. Immutable once parsed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HookDefinition {
    #[serde(rename = "type", default)]
    pub kind: HookKind,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_timeout", rename = "timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_HOOK_TIMEOUT_SECS
}

impl HookDefinition {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            kind: HookKind::Command,
            command: command.into(),
            prompt: String::new(),
            timeout_secs: DEFAULT_HOOK_TIMEOUT_SECS,
        }
    }

    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            kind: HookKind::Prompt,
            command: String::new(),
            prompt: text.into(),
            timeout_secs: DEFAULT_HOOK_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// A matcher plus the hooks that fire when it matches a dispatch value.
///
/// `"*"` matches everything including the empty string; any other matcher is
/// tried as a case-insensitive regex search, falling back to literal
/// equality when the pattern does not compile.
#[derive(Clone, Debug)]
pub struct HookRule {
    pub matcher: String,
    pub hooks: Vec<HookDefinition>,
    compiled: OnceLock<Option<Regex>>,
}

impl HookRule {
    pub fn new(matcher: impl Into<String>, hooks: Vec<HookDefinition>) -> Self {
        Self {
            matcher: matcher.into(),
            hooks,
            compiled: OnceLock::new(),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        if self.matcher == "*" {
            return true;
        }
        let pattern = self.compiled.get_or_init(|| {
            RegexBuilder::new(&self.matcher)
                .case_insensitive(true)
                .build()
                .ok()
        });
        match pattern {
            Some(re) => re.is_match(value),
            None => self.matcher == value,
        }
    }
}

/// All hook rules, grouped by lifecycle event.
///
/// Rules for different events are strictly isolated; merging registries
/// concatenates per-event lists and never replaces earlier rules, which is
/// what lets global, project, and plugin-contributed policies coexist.
#[derive(Clone, Debug, Default)]
pub struct HookRegistry {
    rules: [Vec<HookRule>; HookEvent::COUNT],
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self, event: HookEvent) -> &[HookRule] {
        &self.rules[event.index()]
    }

    pub fn push(&mut self, event: HookEvent, rule: HookRule) {
        self.rules[event.index()].push(rule);
    }

    /// Append all of `other`'s rules after this registry's own, per event.
    pub fn merge(&mut self, other: HookRegistry) {
        for (target, source) in self.rules.iter_mut().zip(other.rules) {
            target.extend(source);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.iter().all(|r| r.is_empty())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.iter().map(|r| r.len()).sum()
    }
}
