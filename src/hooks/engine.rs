//! Hook execution engine: rule matching, command spawning, outcome folding.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;

use crate::common::json::PLUGIN_ROOT_VAR;

use super::registry::CONFIRM_COMMAND;
use super::{HookDefinition, HookEvent, HookKind, HookRegistry};

/// The allow/deny/ask verdict a PreToolUse dispatch produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    #[default]
    Allow,
    Deny,
    Ask,
}

impl PermissionDecision {
    pub fn is_deny(&self) -> bool {
        matches!(self, PermissionDecision::Deny)
    }

    pub fn is_ask(&self) -> bool {
        matches!(self, PermissionDecision::Ask)
    }
}

/// Whether the caller should auto-continue after a Stop/SubagentStop dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopDecision {
    #[default]
    Approve,
    Block,
}

/// Combined result of executing all matching hooks for one event dispatch.
///
/// Produced fresh per dispatch and never persisted. Later firing hooks'
/// explicit field values override earlier ones; messages accumulate.
#[derive(Clone, Debug, Default)]
pub struct HookOutcome {
    pub permission: PermissionDecision,
    pub updated_input: Option<Value>,
    pub decision: StopDecision,
    pub reason: String,
    pub messages: Vec<String>,
}

/// Variables substituted into command hooks by literal token replacement.
#[derive(Clone, Debug, Default)]
pub struct HookVariables {
    vars: Vec<(String, String)>,
}

impl HookVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_tool(tool_name: &str, file_path: Option<&str>) -> Self {
        let mut vars = Self::new();
        vars.insert("TOOL_NAME", tool_name);
        vars.insert("FILE", file_path.unwrap_or(""));
        vars
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Apply the variables to a command string.
    ///
    /// The plugin-root placeholder is expanded before plain `$NAME` tokens so
    /// `${CLAUDE_PLUGIN_ROOT}` never gets clipped by a `$CLAUDE...` match.
    fn substitute(&self, command: &str) -> String {
        let mut result = command.to_string();
        if let Some(root) = self.get("CLAUDE_PLUGIN_ROOT") {
            result = result.replace(PLUGIN_ROOT_VAR, root);
        }
        for (name, value) in &self.vars {
            result = result.replace(&format!("${name}"), value);
        }
        result
    }
}

/// Run a single command hook. Returns (exit_code, stdout, stderr).
///
/// Timeouts and spawn failures are folded into the return value as exit code
/// -1 with the error text on stderr; they never escape as errors.
pub async fn run_command_hook(hook: &HookDefinition, variables: &HookVariables) -> (i32, String, String) {
    let command = variables.substitute(&hook.command);
    let timeout = Duration::from_secs(hook.timeout_secs);

    let child = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => return (-1, String::new(), format!("failed to spawn hook: {e}")),
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => (
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ),
        Ok(Err(e)) => (-1, String::new(), format!("hook command failed: {e}")),
        Err(_) => (-1, String::new(), "hook timed out".to_string()),
    }
}

/// Execute all matching hooks for an event and fold their results.
///
/// Rules fire in registration order; every matching rule runs. A failing or
/// timed-out hook contributes its error text as a message and nothing else.
pub async fn execute(
    registry: &HookRegistry,
    event: HookEvent,
    match_value: &str,
    variables: &HookVariables,
) -> HookOutcome {
    let mut outcome = HookOutcome::default();

    for rule in registry.rules(event) {
        if !rule.matches(match_value) {
            continue;
        }
        for hook in &rule.hooks {
            match hook.kind {
                HookKind::Prompt => {
                    if !hook.prompt.is_empty() {
                        outcome.messages.push(hook.prompt.clone());
                    }
                }
                HookKind::Command => {
                    if hook.command == CONFIRM_COMMAND {
                        outcome.permission = PermissionDecision::Ask;
                        continue;
                    }
                    let (exit_code, stdout, stderr) = run_command_hook(hook, variables).await;
                    if exit_code != 0 {
                        tracing::warn!(
                            event = %event,
                            command = %hook.command,
                            exit_code,
                            "hook exited non-zero"
                        );
                    }
                    let stdout = stdout.trim();
                    if !stdout.is_empty() {
                        outcome.messages.push(stdout.to_string());
                    }
                    let stderr = stderr.trim();
                    if exit_code == 2 && !stderr.is_empty() {
                        outcome.messages.push(stderr.to_string());
                    } else if exit_code == -1 && !stderr.is_empty() {
                        // Spawn failure or timeout text, surfaced but not fatal.
                        outcome.messages.push(stderr.to_string());
                    }
                    apply_structured_output(stdout, &mut outcome);
                }
            }
        }
    }

    outcome
}

/// Subset of the JSON hook-output protocol a command may print on stdout.
#[derive(Debug, Deserialize)]
struct StructuredOutput {
    #[serde(rename = "hookSpecificOutput")]
    hook_specific: Option<HookSpecificOutput>,
    decision: Option<StopDecision>,
    reason: Option<String>,
    #[serde(rename = "systemMessage")]
    system_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HookSpecificOutput {
    #[serde(rename = "permissionDecision")]
    permission_decision: Option<PermissionDecision>,
    #[serde(rename = "updatedInput")]
    updated_input: Option<Value>,
}

/// Interpret stdout as structured hook output when it looks like JSON.
///
/// Malformed JSON is treated as plain text and ignored here (it already went
/// into `messages`).
fn apply_structured_output(stdout: &str, outcome: &mut HookOutcome) {
    if !stdout.starts_with('{') {
        return;
    }
    let Ok(parsed) = serde_json::from_str::<StructuredOutput>(stdout) else {
        return;
    };

    if let Some(hso) = parsed.hook_specific {
        if let Some(permission) = hso.permission_decision {
            outcome.permission = permission;
        }
        if let Some(input) = hso.updated_input {
            outcome.updated_input = Some(input);
        }
    }
    if let Some(decision) = parsed.decision {
        outcome.decision = decision;
    }
    if let Some(reason) = parsed.reason {
        outcome.reason = reason;
    }
    if let Some(message) = parsed.system_message {
        if !message.is_empty() {
            outcome.messages.push(message);
        }
    }
}
