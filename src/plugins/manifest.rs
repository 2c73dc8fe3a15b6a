use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PLUGIN_CONFIG_DIR: &str = ".claude-plugin";
pub const PLUGIN_MANIFEST_FILE: &str = "plugin.json";
pub(crate) const INSTALL_META_FILE: &str = "_install_meta.json";

/// Parsed from `.claude-plugin/plugin.json`.
///
/// Everything except `name` is optional; the component fields accept either a
/// single path string or a list of paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub author: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub commands: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub agents: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub skills: Vec<String>,

    /// Path string or inline hooks object.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub hooks: Value,

    /// Path string or inline server map.
    #[serde(default, rename = "mcpServers", skip_serializing_if = "Value::is_null")]
    pub mcp_servers: Value,

    #[serde(default, rename = "lspServers", skip_serializing_if = "Value::is_null")]
    pub lsp_servers: Value,
}

impl PluginManifest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse the manifest under a plugin root.
    ///
    /// Missing files, malformed JSON, and manifests without a name all yield
    /// `None`; the caller falls back to a directory-name manifest.
    pub fn parse(plugin_root: &Path) -> Option<PluginManifest> {
        let path = plugin_root.join(PLUGIN_CONFIG_DIR).join(PLUGIN_MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).ok()?;
        let manifest: PluginManifest = serde_json::from_str(&text).ok()?;
        if manifest.name.is_empty() {
            return None;
        }
        Some(manifest)
    }
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Spec {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Spec::deserialize(deserializer)? {
        Spec::One(s) if s.is_empty() => Vec::new(),
        Spec::One(s) => vec![s],
        Spec::Many(list) => list,
    })
}

/// Sidecar written to `.claude-plugin/_install_meta.json` at install time so
/// the plugin remembers where it came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallRecord {
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub marketplace: String,

    #[serde(default)]
    pub scope: String,

    #[serde(
        default,
        rename = "installedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub installed_at: Option<DateTime<Utc>>,
}

impl InstallRecord {
    pub(crate) fn path(plugin_root: &Path) -> std::path::PathBuf {
        plugin_root.join(PLUGIN_CONFIG_DIR).join(INSTALL_META_FILE)
    }

    pub(crate) fn read(plugin_root: &Path) -> Option<InstallRecord> {
        let text = std::fs::read_to_string(Self::path(plugin_root)).ok()?;
        serde_json::from_str(&text).ok()
    }

    pub(crate) fn write(&self, plugin_root: &Path) -> std::io::Result<()> {
        let path = Self::path(plugin_root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        std::fs::write(path, text)
    }
}
