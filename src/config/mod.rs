//! Runtime configuration assembled from layered settings files.
//!
//! ```rust,no_run
//! # async fn example() {
//! let config = claude_extensions::load_config().await;
//! println!("model: {}", config.model);
//! # }
//! ```

pub mod settings;

pub use settings::{Scope, Settings};

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::common::home_dir;
use crate::hooks::{
    CONFIRM_COMMAND, HookEvent, HookRegistry, convert_legacy_hooks, has_event_keys,
    parse_hooks_config,
};

/// Directory name used for both the global config dir (under the home
/// directory) and the per-project config dir (under the working directory).
pub const CONFIG_DIR_NAME: &str = ".claude";
pub const SETTINGS_FILE: &str = "settings.json";
pub const LOCAL_SETTINGS_FILE: &str = "settings.local.json";

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Merged runtime configuration.
///
/// Hook rules accumulate across scopes; scalar fields take the value from
/// the highest-priority file that sets them.
#[derive(Debug)]
pub struct Config {
    pub cwd: PathBuf,
    pub global_dir: PathBuf,
    /// Explicit project dir override; `None` means auto-detect from `cwd`.
    pub project_dir: Option<PathBuf>,
    pub model: String,
    pub hooks: HookRegistry,
    pub enabled_plugins: std::collections::BTreeMap<String, bool>,
    pub known_marketplaces: std::collections::BTreeMap<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let global_dir = home_dir()
            .map(|home| home.join(CONFIG_DIR_NAME))
            .unwrap_or_else(|| cwd.join(CONFIG_DIR_NAME));
        Self {
            cwd,
            global_dir,
            project_dir: None,
            model: DEFAULT_MODEL.to_string(),
            hooks: HookRegistry::new(),
            enabled_plugins: Default::default(),
            known_marketplaces: Default::default(),
        }
    }

    /// Project config directories that actually exist, in priority order.
    pub fn project_dirs(&self) -> Vec<PathBuf> {
        if let Some(dir) = &self.project_dir {
            return if dir.is_dir() { vec![dir.clone()] } else { vec![] };
        }
        let candidate = self.cwd.join(CONFIG_DIR_NAME);
        if candidate.is_dir() { vec![candidate] } else { vec![] }
    }

    /// The project config dir to write to, whether or not it exists yet.
    pub fn primary_project_dir(&self) -> PathBuf {
        match &self.project_dir {
            Some(dir) => dir.clone(),
            None => self.cwd.join(CONFIG_DIR_NAME),
        }
    }

    pub fn plugin_cache_dir(&self) -> PathBuf {
        self.global_dir.join("plugins").join("cache")
    }

    pub fn marketplace_cache_dir(&self) -> PathBuf {
        self.global_dir.join("marketplaces")
    }

    /// Where a given scope's settings file lives.
    pub fn settings_path(&self, scope: Scope) -> PathBuf {
        match scope {
            Scope::User => self.global_dir.join(SETTINGS_FILE),
            Scope::Project => self.primary_project_dir().join(SETTINGS_FILE),
            Scope::Local => self.primary_project_dir().join(LOCAL_SETTINGS_FILE),
        }
    }

    /// Legacy lookup by `"pre:Tool"` / `"post:Tool"` key.
    ///
    /// Returns the first matching rule's first command, with the internal
    /// confirmation sentinel mapped back to the `"confirm"` the user wrote.
    pub fn get_hook(&self, key: &str) -> Option<String> {
        let (prefix, tool_name) = key.split_once(':')?;
        let event = match prefix {
            "pre" => HookEvent::PreToolUse,
            "post" => HookEvent::PostToolUse,
            _ => return None,
        };
        for rule in self.hooks.rules(event) {
            if rule.matches(tool_name) {
                if let Some(hook) = rule.hooks.first() {
                    return Some(if hook.command == CONFIRM_COMMAND {
                        "confirm".to_string()
                    } else {
                        hook.command.clone()
                    });
                }
            }
        }
        None
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold one settings file into the config.
///
/// Hook sections are interpreted by dialect: top-level event keys or a
/// `hooks` object with event keys use the structured format, any other
/// `hooks` object is treated as the legacy `pre:`/`post:` map.
async fn apply_settings(config: &mut Config, path: &Path) {
    let settings = Settings::read(path).await;

    if let Some(model) = settings.model {
        config.model = model;
    }
    config.enabled_plugins.extend(settings.enabled_plugins);
    config
        .known_marketplaces
        .extend(settings.extra_known_marketplaces);

    let top_level = Value::Object(
        settings
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    );
    if has_event_keys(&top_level) {
        config.hooks.merge(parse_hooks_config(&top_level));
    } else if let Some(Value::Object(hooks)) = settings.hooks {
        let hooks_value = Value::Object(hooks.clone());
        if has_event_keys(&hooks_value) {
            config.hooks.merge(parse_hooks_config(&hooks_value));
        } else {
            config.hooks.merge(convert_legacy_hooks(&hooks));
        }
    }
}

/// Load configuration from global then project then project-local settings.
pub async fn load_config() -> Config {
    let mut config = Config::new();
    load_into(&mut config).await;
    config
}

/// Apply the settings layers to an already-constructed config.
///
/// Useful when `cwd`, `global_dir`, or `project_dir` are overridden first.
pub async fn load_into(config: &mut Config) {
    let global = config.global_dir.join(SETTINGS_FILE);
    apply_settings(config, &global).await;

    for dir in config.project_dirs() {
        apply_settings(config, &dir.join(SETTINGS_FILE)).await;
    }
    for dir in config.project_dirs() {
        apply_settings(config, &dir.join(LOCAL_SETTINGS_FILE)).await;
    }
}
