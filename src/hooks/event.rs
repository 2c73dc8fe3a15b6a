//! Lifecycle event types.

use serde::{Deserialize, Serialize};

/// Hook event types that trigger hook execution.
///
/// This is a closed set: registries are indexed per event and rules for one
/// event never fire for another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    /// Before a tool is executed (can block or modify input)
    PreToolUse,

    /// After tool execution
    PostToolUse,

    /// When the agent stops at the end of a turn
    Stop,

    /// When a subagent completes
    SubagentStop,

    /// When a session begins
    SessionStart,

    /// When a session ends
    SessionEnd,

    /// When the user submits a prompt
    UserPromptSubmit,

    /// Before conversation compaction
    PreCompact,

    /// For custom notifications
    Notification,
}

impl HookEvent {
    pub const COUNT: usize = 9;

    /// Get all hook events, in registry order.
    pub fn all() -> &'static [HookEvent] {
        &[
            HookEvent::PreToolUse,
            HookEvent::PostToolUse,
            HookEvent::Stop,
            HookEvent::SubagentStop,
            HookEvent::SessionStart,
            HookEvent::SessionEnd,
            HookEvent::UserPromptSubmit,
            HookEvent::PreCompact,
            HookEvent::Notification,
        ]
    }

    /// Parse a settings-file event key. Unknown names are `None`, so config
    /// parsing can skip them instead of silently misfiling rules.
    pub fn from_name(name: &str) -> Option<HookEvent> {
        match name {
            "PreToolUse" => Some(HookEvent::PreToolUse),
            "PostToolUse" => Some(HookEvent::PostToolUse),
            "Stop" => Some(HookEvent::Stop),
            "SubagentStop" => Some(HookEvent::SubagentStop),
            "SessionStart" => Some(HookEvent::SessionStart),
            "SessionEnd" => Some(HookEvent::SessionEnd),
            "UserPromptSubmit" => Some(HookEvent::UserPromptSubmit),
            "PreCompact" => Some(HookEvent::PreCompact),
            "Notification" => Some(HookEvent::Notification),
            _ => None,
        }
    }

    /// The settings-file key for this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::Stop => "Stop",
            HookEvent::SubagentStop => "SubagentStop",
            HookEvent::SessionStart => "SessionStart",
            HookEvent::SessionEnd => "SessionEnd",
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
            HookEvent::PreCompact => "PreCompact",
            HookEvent::Notification => "Notification",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            HookEvent::PreToolUse => 0,
            HookEvent::PostToolUse => 1,
            HookEvent::Stop => 2,
            HookEvent::SubagentStop => 3,
            HookEvent::SessionStart => 4,
            HookEvent::SessionEnd => 5,
            HookEvent::UserPromptSubmit => 6,
            HookEvent::PreCompact => 7,
            HookEvent::Notification => 8,
        }
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
