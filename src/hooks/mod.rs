//! Hook system: lifecycle events, rule matching, and command execution.
//!
//! Hooks are shell commands (or canned prompt strings) bound to lifecycle
//! events such as [`HookEvent::PreToolUse`]. Rules come from settings files
//! and plugin sidecars via the [`parser`] functions, accumulate in a
//! [`HookRegistry`], and fire through [`execute`]. [`HookMiddleware`] wraps
//! tool execution with the PreToolUse / PostToolUse policy.

mod engine;
mod event;
mod middleware;
pub mod parser;
mod registry;

pub use engine::{
    HookOutcome, HookVariables, PermissionDecision, StopDecision, execute, run_command_hook,
};
pub use event::HookEvent;
pub use middleware::{
    ConfirmPrompt, HookMiddleware, ToolCallRequest, ToolHandler, ToolResponse, WrappedCall,
};
pub use parser::{convert_legacy_hooks, has_event_keys, parse_hooks_config};
pub use registry::{
    CONFIRM_COMMAND, DEFAULT_HOOK_TIMEOUT_SECS, HookDefinition, HookKind, HookRegistry, HookRule,
};
