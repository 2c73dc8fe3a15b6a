//! Tool-call policy middleware: PreToolUse / PostToolUse around a handler.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::engine::{HookOutcome, HookVariables, execute};
use super::registry::CONFIRM_COMMAND;
use super::{HookEvent, HookRegistry};

/// A tool invocation about to be executed.
#[derive(Clone, Debug)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Result of a tool invocation, or of a policy denial standing in for one.
#[derive(Clone, Debug)]
pub struct ToolResponse {
    pub tool_call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn ok(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    fn denied(tool_call_id: &str, content: &str) -> Self {
        Self {
            tool_call_id: tool_call_id.to_string(),
            content: content.to_string(),
            is_error: true,
        }
    }
}

/// The actual tool execution the middleware wraps.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, request: ToolCallRequest) -> ToolResponse;
}

/// Interactive confirmation seam for the `ask` permission.
///
/// The engine never does I/O; whoever drives the agent loop decides how to
/// prompt. A middleware without a prompt treats `ask` as a denial.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, tool_name: &str, arguments: &Map<String, Value>) -> bool;
}

/// A wrapped tool call: the response plus any hook messages to surface.
#[derive(Debug)]
pub struct WrappedCall {
    pub response: ToolResponse,
    pub hook_messages: Vec<String>,
}

/// Runs PreToolUse / PostToolUse hooks around tool calls and Stop hooks at
/// turn boundaries.
pub struct HookMiddleware {
    registry: HookRegistry,
    confirm: Option<Box<dyn ConfirmPrompt>>,
}

impl HookMiddleware {
    pub fn new(registry: HookRegistry) -> Self {
        Self {
            registry,
            confirm: None,
        }
    }

    pub fn with_confirm_prompt(mut self, prompt: Box<dyn ConfirmPrompt>) -> Self {
        self.confirm = Some(prompt);
        self
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Run PreToolUse hooks, the handler, then PostToolUse hooks.
    ///
    /// A deny verdict short-circuits before the handler; an ask verdict
    /// blocks on the confirm prompt. The handler runs at most once.
    pub async fn wrap_tool_call(
        &self,
        mut request: ToolCallRequest,
        handler: &dyn ToolHandler,
    ) -> WrappedCall {
        let file_path = request
            .arguments
            .get("file_path")
            .or_else(|| request.arguments.get("path"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let variables = HookVariables::for_tool(&request.name, Some(file_path));

        let pre = execute(&self.registry, HookEvent::PreToolUse, &request.name, &variables).await;
        let mut hook_messages: Vec<String> = pre
            .messages
            .iter()
            .filter(|m| !m.is_empty() && *m != CONFIRM_COMMAND)
            .cloned()
            .collect();

        if pre.permission.is_deny() {
            return WrappedCall {
                response: ToolResponse::denied(&request.id, "Tool call denied by hook."),
                hook_messages,
            };
        }

        if pre.permission.is_ask() {
            let approved = match &self.confirm {
                Some(prompt) => prompt.confirm(&request.name, &request.arguments).await,
                None => false,
            };
            if !approved {
                return WrappedCall {
                    response: ToolResponse::denied(&request.id, "Tool call denied by user."),
                    hook_messages,
                };
            }
        }

        if let Some(Value::Object(updates)) = pre.updated_input {
            for (key, value) in updates {
                request.arguments.insert(key, value);
            }
        }

        let response = handler.handle(request.clone()).await;

        let post = execute(&self.registry, HookEvent::PostToolUse, &request.name, &variables).await;
        hook_messages.extend(post.messages.into_iter().filter(|m| !m.is_empty()));

        WrappedCall {
            response,
            hook_messages,
        }
    }

    /// Run Stop or SubagentStop hooks at a turn boundary.
    ///
    /// A `Block` decision means the caller should feed `reason` back to the
    /// model instead of ending the turn.
    pub async fn dispatch_stop(&self, event: HookEvent) -> HookOutcome {
        debug_assert!(matches!(event, HookEvent::Stop | HookEvent::SubagentStop));
        execute(&self.registry, event, "", &HookVariables::new()).await
    }
}
