//! Serde model for `settings.json` files.
//!
//! Settings files are user-edited and shared with other tools, so parsing is
//! permissive: unknown keys are preserved in `extra` and written back intact.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which settings file a value comes from or is written to.
///
/// Priority at load time is User < Project < Local; hooks accumulate across
/// all three while scalars take the last value seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    User,
    Project,
    Local,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Project => "project",
            Scope::Local => "local",
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Scope::User),
            "project" => Ok(Scope::Project),
            "local" => Ok(Scope::Local),
            other => Err(format!("unknown scope '{other}' (expected user, project, or local)")),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `settings.json` file, round-trippable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(
        default,
        rename = "enabledPlugins",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub enabled_plugins: BTreeMap<String, bool>,

    #[serde(
        default,
        rename = "extraKnownMarketplaces",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub extra_known_marketplaces: BTreeMap<String, Value>,

    /// Hook configuration in either dialect; interpreted at config-load time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Settings {
    /// Read a settings file. Missing or malformed files become defaults.
    pub async fn read(path: &Path) -> Settings {
        let Ok(text) = tokio::fs::read_to_string(path).await else {
            return Settings::default();
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
                Settings::default()
            }
        }
    }

    /// Write the settings file, creating parent directories as needed.
    pub async fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        tokio::fs::write(path, text).await
    }
}
