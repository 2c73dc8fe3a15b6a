//! Plugin loading and component discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::common::{deep_merge, expand_plugin_root};
use crate::config::Config;

use super::lifecycle::is_plugin_enabled;
use super::manifest::{InstallRecord, PLUGIN_CONFIG_DIR, PLUGIN_MANIFEST_FILE, PluginManifest};

/// Resolved component paths and data from a loaded plugin.
#[derive(Debug, Clone, Default)]
pub struct PluginComponents {
    pub command_dirs: Vec<PathBuf>,
    pub skill_dirs: Vec<PathBuf>,
    pub agent_dirs: Vec<PathBuf>,
    /// Hooks config in the structured settings dialect, plugin root expanded.
    pub hooks_config: Value,
    pub mcp_servers: BTreeMap<String, Value>,
}

/// A loaded plugin with all resolved components.
///
/// Loading never fails outright; problems land in `error` so one broken
/// plugin cannot take down a session.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub name: String,
    pub root: PathBuf,
    pub manifest: PluginManifest,
    pub components: PluginComponents,
    pub source: String,
    pub marketplace: String,
    pub enabled: bool,
    pub error: Option<String>,
}

impl Plugin {
    fn broken(name: String, root: PathBuf, manifest: PluginManifest, error: String) -> Self {
        Self {
            name,
            root,
            manifest,
            components: PluginComponents::default(),
            source: String::new(),
            marketplace: String::new(),
            enabled: true,
            error: Some(error),
        }
    }

    fn attach_install_record(&mut self, record: Option<InstallRecord>) {
        if let Some(record) = record {
            self.source = record.source;
            self.marketplace = record.marketplace;
        }
    }
}

fn strip_relative(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

/// Read a JSON file. Missing files and malformed JSON count as absent;
/// any other I/O failure is a real discovery error.
fn read_json_lenient(path: &Path) -> std::io::Result<Option<Value>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(serde_json::from_str(&text).ok()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn discover_components(
    plugin_root: &Path,
    manifest: &PluginManifest,
) -> std::io::Result<PluginComponents> {
    let mut components = PluginComponents::default();
    let root_str = plugin_root.display().to_string();

    collect_dirs(
        plugin_root,
        "commands",
        &manifest.commands,
        true,
        &mut components.command_dirs,
    );
    collect_dirs(
        plugin_root,
        "skills",
        &manifest.skills,
        false,
        &mut components.skill_dirs,
    );
    collect_dirs(
        plugin_root,
        "agents",
        &manifest.agents,
        true,
        &mut components.agent_dirs,
    );

    // hooks/hooks.json first, then the manifest's inline object or file path
    // deep-merged on top.
    let mut hooks_data = read_json_lenient(&plugin_root.join("hooks").join("hooks.json"))?
        .unwrap_or(Value::Null);
    match &manifest.hooks {
        Value::Object(_) => {
            hooks_data = deep_merge(hooks_data, manifest.hooks.clone());
        }
        Value::String(path) if !path.is_empty() => {
            if let Some(extra) = read_json_lenient(&plugin_root.join(strip_relative(path)))? {
                hooks_data = deep_merge(hooks_data, extra);
            }
        }
        _ => {}
    }
    if !hooks_data.is_null() {
        components.hooks_config = expand_plugin_root(hooks_data, &root_str);
    }

    let mut mcp_data: BTreeMap<String, Value> = BTreeMap::new();
    if let Some(raw) = read_json_lenient(&plugin_root.join(".mcp.json"))? {
        extend_server_map(&mut mcp_data, &raw);
    }
    match &manifest.mcp_servers {
        Value::Object(servers) => {
            for (name, server) in servers {
                mcp_data.insert(name.clone(), server.clone());
            }
        }
        Value::String(path) if !path.is_empty() => {
            if let Some(raw) = read_json_lenient(&plugin_root.join(strip_relative(path)))? {
                extend_server_map(&mut mcp_data, &raw);
            }
        }
        _ => {}
    }
    components.mcp_servers = mcp_data
        .into_iter()
        .map(|(name, server)| (name, expand_plugin_root(server, &root_str)))
        .collect();

    Ok(components)
}

/// Default convention dir plus any manifest-declared paths. Files are only
/// accepted where markdown entries make sense (commands, agents).
fn collect_dirs(
    plugin_root: &Path,
    convention: &str,
    custom: &[String],
    allow_md_files: bool,
    out: &mut Vec<PathBuf>,
) {
    let default = plugin_root.join(convention);
    if default.is_dir() {
        out.push(default);
    }
    for spec in custom {
        let path = plugin_root.join(strip_relative(spec));
        let is_md_file =
            allow_md_files && path.is_file() && path.extension().is_some_and(|e| e == "md");
        if path.is_dir() || is_md_file {
            out.push(path);
        }
    }
}

/// Servers live under `mcpServers` or, in older files, `servers`.
fn extend_server_map(out: &mut BTreeMap<String, Value>, raw: &Value) {
    let servers = raw
        .get("mcpServers")
        .or_else(|| raw.get("servers"))
        .and_then(Value::as_object);
    if let Some(servers) = servers {
        for (name, server) in servers {
            out.insert(name.clone(), server.clone());
        }
    }
}

/// Load a plugin from a directory.
///
/// A missing directory or a component-discovery failure is reported through
/// the returned plugin's `error` field. A missing or corrupt manifest falls
/// back to a manifest named after the directory.
pub fn load_plugin(plugin_root: &Path, name_override: Option<&str>) -> Plugin {
    let dir_name = || {
        plugin_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let fallback_name = name_override.map(str::to_string).unwrap_or_else(dir_name);

    if !plugin_root.is_dir() {
        return Plugin::broken(
            fallback_name.clone(),
            plugin_root.to_path_buf(),
            PluginManifest::named(fallback_name),
            format!("plugin directory not found: {}", plugin_root.display()),
        );
    }

    let mut manifest = PluginManifest::parse(plugin_root)
        .unwrap_or_else(|| PluginManifest::named(fallback_name));
    if let Some(name) = name_override {
        manifest.name = name.to_string();
    }

    match discover_components(plugin_root, &manifest) {
        Ok(components) => Plugin {
            name: manifest.name.clone(),
            root: plugin_root.to_path_buf(),
            manifest,
            components,
            source: String::new(),
            marketplace: String::new(),
            enabled: true,
            error: None,
        },
        Err(e) => {
            let name = manifest.name.clone();
            Plugin::broken(name, plugin_root.to_path_buf(), manifest, e.to_string())
        }
    }
}

/// Structural checks for a plugin directory, returned as human-readable
/// problems rather than errors.
pub fn validate_plugin(path: &Path) -> Vec<String> {
    let mut problems = Vec::new();
    if !path.is_dir() {
        problems.push(format!("not a directory: {}", path.display()));
        return problems;
    }

    let manifest_path = path.join(PLUGIN_CONFIG_DIR).join(PLUGIN_MANIFEST_FILE);
    if manifest_path.exists() {
        match std::fs::read_to_string(&manifest_path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()))
        {
            Ok(data) => {
                if data.get("name").is_none() {
                    problems.push("plugin.json: missing required field 'name'".to_string());
                }
            }
            Err(e) => {
                problems.push(format!("invalid JSON in plugin.json: {e}"));
                return problems;
            }
        }
    }

    let config_dir = path.join(PLUGIN_CONFIG_DIR);
    if config_dir.is_dir() {
        for misplaced in ["commands", "agents", "skills", "hooks"] {
            if config_dir.join(misplaced).exists() {
                problems.push(format!(
                    "'{misplaced}/' found inside {PLUGIN_CONFIG_DIR}/; move it to plugin root"
                ));
            }
        }
    }
    problems
}

fn cached_plugin_dirs(config: &Config) -> Vec<PathBuf> {
    let cache_dir = config.plugin_cache_dir();
    let Ok(entries) = std::fs::read_dir(&cache_dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

/// List every installed plugin, including disabled and broken ones.
pub fn list_plugins(config: &Config) -> Vec<Plugin> {
    let mut plugins = Vec::new();
    for dir in cached_plugin_dirs(config) {
        let mut plugin = load_plugin(&dir, None);
        plugin.attach_install_record(InstallRecord::read(&dir));
        plugin.enabled = is_plugin_enabled(config, &plugin.name, &plugin.marketplace);
        plugins.push(plugin);
    }
    plugins
}

/// Load all enabled plugins from the cache plus any extra directories.
///
/// Extra directories win name conflicts against the cache. Broken plugins
/// are logged and skipped.
pub fn load_enabled_plugins(config: &Config, extra_dirs: &[PathBuf]) -> Vec<Plugin> {
    let mut plugins: Vec<Plugin> = Vec::new();
    let mut loaded: std::collections::BTreeSet<String> = Default::default();

    for dir in extra_dirs {
        let resolved = dir.canonicalize().unwrap_or_else(|_| dir.clone());
        let plugin = load_plugin(&resolved, None);
        if let Some(error) = &plugin.error {
            tracing::warn!(path = %dir.display(), error, "skipping plugin");
        } else {
            loaded.insert(plugin.name.clone());
            plugins.push(plugin);
        }
    }

    for dir in cached_plugin_dirs(config) {
        let mut plugin = load_plugin(&dir, None);
        if loaded.contains(&plugin.name) {
            continue;
        }
        plugin.attach_install_record(InstallRecord::read(&dir));
        if !is_plugin_enabled(config, &plugin.name, &plugin.marketplace) {
            continue;
        }
        if let Some(error) = &plugin.error {
            tracing::warn!(plugin = %plugin.name, error, "skipping plugin");
            continue;
        }
        loaded.insert(plugin.name.clone());
        plugins.push(plugin);
    }

    plugins
}
