//! Hook config parsing for both settings dialects.
//!
//! Two shapes are accepted: the structured per-event rule-list format
//! (optionally nested one level under a `"hooks"` key), and the flat legacy
//! `"pre:<tool>"` / `"post:<tool>"` string map. Both normalize into a
//! [`HookRegistry`]; unknown keys are ignored for forward compatibility.

use serde_json::Value;

use super::registry::CONFIRM_COMMAND;
use super::{HookDefinition, HookEvent, HookRegistry, HookRule};

pub fn parse_hook_def(raw: &Value) -> HookDefinition {
    serde_json::from_value(raw.clone()).unwrap_or_else(|_| HookDefinition::command(""))
}

pub fn parse_hook_rule(raw: &Value) -> HookRule {
    let matcher = raw
        .get("matcher")
        .and_then(Value::as_str)
        .unwrap_or("*")
        .to_string();
    let hooks = raw
        .get("hooks")
        .and_then(Value::as_array)
        .map(|defs| defs.iter().map(parse_hook_def).collect())
        .unwrap_or_default();
    HookRule::new(matcher, hooks)
}

/// True when `data` has at least one of the nine event keys at top level.
pub fn has_event_keys(data: &Value) -> bool {
    data.as_object().is_some_and(|map| {
        HookEvent::all()
            .iter()
            .any(|event| map.contains_key(event.as_str()))
    })
}

/// Parse a structured hooks config object into a registry.
///
/// Event keys may appear at top level or nested under `"hooks"`; everything
/// else in `data` is ignored.
pub fn parse_hooks_config(data: &Value) -> HookRegistry {
    let data = match data.get("hooks") {
        Some(inner) if has_event_keys(inner) => inner,
        _ => data,
    };

    let mut registry = HookRegistry::new();
    for event in HookEvent::all() {
        let Some(rules) = data.get(event.as_str()).and_then(Value::as_array) else {
            continue;
        };
        for raw in rules.iter().filter(|r| r.is_object()) {
            registry.push(*event, parse_hook_rule(raw));
        }
    }
    registry
}

/// Convert a flat legacy hook map into a registry.
///
/// `"pre:<tool>"` keys become PreToolUse rules, `"post:<tool>"` keys become
/// PostToolUse rules; the tool name is regex-escaped so metacharacters in
/// tool names match literally. The value `"confirm"` on a pre hook becomes
/// the reserved confirm command.
pub fn convert_legacy_hooks(legacy: &serde_json::Map<String, Value>) -> HookRegistry {
    let mut registry = HookRegistry::new();
    for (key, value) in legacy {
        let Some((prefix, tool_name)) = key.split_once(':') else {
            continue;
        };
        let Some(command) = value.as_str() else {
            continue;
        };
        let matcher = regex::escape(tool_name);
        match prefix {
            "pre" => {
                let command = if command == "confirm" {
                    CONFIRM_COMMAND
                } else {
                    command
                };
                registry.push(
                    HookEvent::PreToolUse,
                    HookRule::new(matcher, vec![HookDefinition::command(command)]),
                );
            }
            "post" => {
                registry.push(
                    HookEvent::PostToolUse,
                    HookRule::new(matcher, vec![HookDefinition::command(command)]),
                );
            }
            _ => {}
        }
    }
    registry
}
