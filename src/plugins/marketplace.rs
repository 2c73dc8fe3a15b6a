//! Marketplace system: descriptor parsing, registration, and plugin
//! source resolution (local path, GitHub shorthand, git URL).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::fs::replace_dir;
use crate::config::{Config, Scope};

use super::error::PluginError;
use super::lifecycle::install_plugin_from_path;
use super::loader::Plugin;
use super::manifest::PLUGIN_CONFIG_DIR;

pub const MARKETPLACE_FILE: &str = "marketplace.json";
const MARKETPLACE_INDEX_FILE: &str = "_marketplaces.json";

const CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// How a marketplace was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Local,
    GitHub,
    Git,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Local => "local",
            SourceType::GitHub => "github",
            SourceType::Git => "git",
        }
    }
}

/// A plugin listing inside a marketplace descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceEntry {
    #[serde(default)]
    pub name: String,

    /// Relative path, GitHub shorthand, git URL, or a structured source
    /// object.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub source: Value,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub author: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
}

/// A parsed marketplace descriptor plus its registration metadata.
#[derive(Debug, Clone)]
pub struct Marketplace {
    pub name: String,
    pub owner: BTreeMap<String, String>,
    pub plugins: Vec<MarketplaceEntry>,
    pub description: String,
    pub source_type: Option<SourceType>,
    /// Original source: path, owner/repo shorthand, or URL.
    pub source_ref: String,
    /// Where the marketplace is cached, if it is.
    pub local_path: Option<PathBuf>,
}

impl Marketplace {
    fn placeholder(name: String, source_type: Option<SourceType>, source_ref: String) -> Self {
        Self {
            name,
            owner: BTreeMap::new(),
            plugins: Vec::new(),
            description: String::new(),
            source_type,
            source_ref,
            local_path: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MarketplaceIndex {
    #[serde(default)]
    marketplaces: BTreeMap<String, RegisteredSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegisteredSource {
    #[serde(default)]
    source_type: Option<SourceType>,
    #[serde(default)]
    source_ref: String,
}

fn index_path(config: &Config) -> PathBuf {
    config.marketplace_cache_dir().join(MARKETPLACE_INDEX_FILE)
}

fn load_index(config: &Config) -> MarketplaceIndex {
    let Ok(text) = std::fs::read_to_string(index_path(config)) else {
        return MarketplaceIndex::default();
    };
    serde_json::from_str(&text).unwrap_or_default()
}

fn save_index(config: &Config, index: &MarketplaceIndex) -> Result<(), PluginError> {
    let path = index_path(config);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(index)?)?;
    Ok(())
}

/// Locate the descriptor under a marketplace root: the `.claude-plugin/`
/// location first, then the repo root.
pub(crate) fn find_descriptor(root: &Path) -> Option<PathBuf> {
    let preferred = root.join(PLUGIN_CONFIG_DIR).join(MARKETPLACE_FILE);
    if preferred.exists() {
        return Some(preferred);
    }
    let fallback = root.join(MARKETPLACE_FILE);
    fallback.exists().then_some(fallback)
}

#[derive(Debug, Default, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    owner: BTreeMap<String, String>,
    #[serde(default)]
    plugins: Vec<Value>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

/// Parse a descriptor file. Entries without a name are skipped; a missing
/// marketplace name is an error.
pub(crate) fn parse_descriptor(path: &Path) -> Result<Marketplace, PluginError> {
    let text = std::fs::read_to_string(path).map_err(|e| PluginError::DescriptorInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let raw: RawDescriptor =
        serde_json::from_str(&text).map_err(|e| PluginError::DescriptorInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if raw.name.is_empty() {
        return Err(PluginError::DescriptorInvalid {
            path: path.to_path_buf(),
            reason: "missing required field 'name'".to_string(),
        });
    }

    let plugins = raw
        .plugins
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<MarketplaceEntry>(entry).ok())
        .filter(|entry| !entry.name.is_empty())
        .collect();
    let description = raw
        .metadata
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(Marketplace {
        name: raw.name,
        owner: raw.owner,
        plugins,
        description,
        source_type: None,
        source_ref: String::new(),
        local_path: None,
    })
}

/// `owner/repo` shorthand: exactly two non-empty segments, neither leading
/// with a dash, and no path or URL punctuation.
pub(crate) fn is_github_ref(source: &str) -> bool {
    let source = source.trim();
    if source.starts_with('.') || source.starts_with('/') || source.contains(':') {
        return false;
    }
    let parts: Vec<&str> = source.split('/').collect();
    parts.len() == 2 && parts.iter().all(|p| !p.is_empty() && !p.starts_with('-'))
}

pub(crate) fn is_git_url(source: &str) -> bool {
    source.ends_with(".git") || source.starts_with("git@")
}

/// Shallow-clone a git source into `dest`.
///
/// A trailing `#ref` selects a branch or tag. The source must already look
/// like a GitHub shorthand or git URL.
pub(crate) async fn clone_source(source: &str, dest: &Path) -> Result<(), PluginError> {
    let (bare, git_ref) = match source.rsplit_once('#') {
        Some((bare, git_ref)) => (bare, Some(git_ref)),
        None => (source, None),
    };

    let url = if is_github_ref(bare) {
        format!("https://github.com/{bare}.git")
    } else if is_git_url(bare) || is_git_url(source) {
        bare.to_string()
    } else {
        return Err(PluginError::UnsupportedSource {
            source_ref: source.to_string(),
        });
    };

    let mut cmd = tokio::process::Command::new("git");
    cmd.arg("clone").arg("--depth").arg("1");
    if let Some(git_ref) = git_ref {
        cmd.arg("--branch").arg(git_ref);
    }
    cmd.arg(&url).arg(dest);

    let clone_failed = |reason: String| PluginError::CloneFailed {
        source_ref: source.to_string(),
        reason,
    };

    let output = tokio::time::timeout(CLONE_TIMEOUT, cmd.output())
        .await
        .map_err(|_| clone_failed("clone timed out".to_string()))?
        .map_err(|e| clone_failed(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(clone_failed(stderr.trim().to_string()));
    }
    Ok(())
}

fn register(config: &Config, marketplace: &Marketplace) -> Result<(), PluginError> {
    let mut index = load_index(config);
    index.marketplaces.insert(
        marketplace.name.clone(),
        RegisteredSource {
            source_type: marketplace.source_type,
            source_ref: marketplace.source_ref.clone(),
        },
    );
    save_index(config, &index)
}

/// Add a marketplace from a local path, GitHub shorthand, or git URL.
///
/// Remote sources are cloned to a temp dir first; nothing is cached or
/// registered unless the descriptor parses.
pub async fn add_marketplace(config: &Config, source: &str) -> Result<Marketplace, PluginError> {
    let source = source.trim();
    let cache_dir = config.marketplace_cache_dir();
    let source_path = Path::new(source);

    if source_path.is_dir() {
        let source_path = source_path.canonicalize()?;
        let descriptor = find_descriptor(&source_path).ok_or_else(|| {
            PluginError::DescriptorMissing {
                path: source_path.clone(),
            }
        })?;
        let mut marketplace = parse_descriptor(&descriptor)?;
        let dest = cache_dir.join(&marketplace.name);
        replace_dir(&source_path, &dest)?;
        marketplace.source_type = Some(SourceType::Local);
        marketplace.source_ref = source_path.display().to_string();
        marketplace.local_path = Some(dest);
        register(config, &marketplace)?;
        tracing::info!(marketplace = %marketplace.name, "added marketplace");
        return Ok(marketplace);
    }

    // A bare descriptor file gets wrapped in a minimal cached layout.
    if source_path.is_file() && source_path.file_name().is_some_and(|n| n == MARKETPLACE_FILE) {
        let source_path = source_path.canonicalize()?;
        let mut marketplace = parse_descriptor(&source_path)?;
        let dest = cache_dir.join(&marketplace.name);
        let config_dir = dest.join(PLUGIN_CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;
        std::fs::copy(&source_path, config_dir.join(MARKETPLACE_FILE))?;
        marketplace.source_type = Some(SourceType::Local);
        marketplace.source_ref = source_path
            .parent()
            .unwrap_or(&source_path)
            .display()
            .to_string();
        marketplace.local_path = Some(dest);
        register(config, &marketplace)?;
        tracing::info!(marketplace = %marketplace.name, "added marketplace");
        return Ok(marketplace);
    }

    if is_github_ref(source) || is_git_url(source) {
        let tmp = tempfile::tempdir()?;
        let checkout = tmp.path().join("repo");
        clone_source(source, &checkout).await?;
        let descriptor =
            find_descriptor(&checkout).ok_or_else(|| PluginError::DescriptorMissing {
                path: checkout.clone(),
            })?;
        let mut marketplace = parse_descriptor(&descriptor)?;
        let dest = cache_dir.join(&marketplace.name);
        replace_dir(&checkout, &dest)?;
        marketplace.source_type = Some(if is_github_ref(source) {
            SourceType::GitHub
        } else {
            SourceType::Git
        });
        marketplace.source_ref = source.to_string();
        marketplace.local_path = Some(dest);
        register(config, &marketplace)?;
        tracing::info!(marketplace = %marketplace.name, source, "added marketplace");
        return Ok(marketplace);
    }

    Err(PluginError::UnsupportedSource {
        source_ref: source.to_string(),
    })
}

/// Remove a marketplace's cache entry and registration.
///
/// Returns whether the marketplace was actually registered.
pub fn remove_marketplace(config: &Config, name: &str) -> Result<bool, PluginError> {
    let cached = config.marketplace_cache_dir().join(name);
    if cached.exists() {
        std::fs::remove_dir_all(&cached)?;
    }

    let mut index = load_index(config);
    let was_registered = index.marketplaces.remove(name).is_some();
    if was_registered {
        save_index(config, &index)?;
    }
    Ok(was_registered)
}

/// Re-fetch a marketplace from its recorded source.
pub async fn update_marketplace(config: &Config, name: &str) -> Result<Marketplace, PluginError> {
    let index = load_index(config);
    let info = index
        .marketplaces
        .get(name)
        .filter(|info| !info.source_ref.is_empty())
        .ok_or_else(|| PluginError::MarketplaceNotFound {
            name: name.to_string(),
        })?;
    let source = info.source_ref.clone();
    add_marketplace(config, &source).await
}

/// All registered marketplaces, plus unfetched ones the settings files hint
/// at via `extraKnownMarketplaces`.
///
/// A registered marketplace whose cache is broken or missing appears as a
/// plugin-less placeholder.
pub fn list_marketplaces(config: &Config) -> Vec<Marketplace> {
    let cache_dir = config.marketplace_cache_dir();
    let index = load_index(config);

    let mut result: Vec<Marketplace> = Vec::new();
    for (name, info) in &index.marketplaces {
        let local = cache_dir.join(name);
        let parsed = find_descriptor(&local).and_then(|d| parse_descriptor(&d).ok());
        match parsed {
            Some(mut marketplace) => {
                marketplace.source_type = info.source_type;
                marketplace.source_ref = info.source_ref.clone();
                marketplace.local_path = Some(local);
                result.push(marketplace);
            }
            None => {
                result.push(Marketplace::placeholder(
                    name.clone(),
                    info.source_type,
                    info.source_ref.clone(),
                ));
            }
        }
    }

    for (name, hint) in &config.known_marketplaces {
        if result.iter().any(|m| &m.name == name) {
            continue;
        }
        let source_info = hint.get("source").unwrap_or(hint);
        let source_type = source_info
            .get("source")
            .and_then(Value::as_str)
            .and_then(|s| serde_json::from_value(Value::String(s.to_string())).ok());
        let source_ref = source_info
            .get("repo")
            .or_else(|| source_info.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        result.push(Marketplace::placeholder(name.clone(), source_type, source_ref));
    }

    result
}

/// Every plugin offered by every marketplace, tagged with its host.
pub fn discover_plugins(config: &Config) -> Vec<(String, MarketplaceEntry)> {
    list_marketplaces(config)
        .into_iter()
        .flat_map(|marketplace| {
            let name = marketplace.name;
            marketplace
                .plugins
                .into_iter()
                .map(move |entry| (name.clone(), entry))
        })
        .collect()
}

/// Install a plugin by name from a registered marketplace.
pub async fn install_from_marketplace(
    config: &Config,
    plugin_name: &str,
    marketplace_name: &str,
    scope: Scope,
) -> Result<Plugin, PluginError> {
    let market_dir = config.marketplace_cache_dir().join(marketplace_name);
    let marketplace = find_descriptor(&market_dir)
        .and_then(|d| parse_descriptor(&d).ok())
        .ok_or_else(|| PluginError::MarketplaceNotFound {
            name: marketplace_name.to_string(),
        })?;

    let entry = marketplace
        .plugins
        .iter()
        .find(|p| p.name == plugin_name)
        .ok_or_else(|| PluginError::PluginNotFound {
            name: plugin_name.to_string(),
            marketplace: marketplace_name.to_string(),
        })?;

    match &entry.source {
        Value::String(source) if source.starts_with("./") => {
            let plugin_dir = market_dir.join(source.trim_start_matches("./"));
            if !plugin_dir.is_dir() {
                return Err(PluginError::DirectoryNotFound { path: plugin_dir });
            }
            install_plugin_from_path(config, &plugin_dir, scope, marketplace_name).await
        }
        Value::String(source) if is_github_ref(source) || is_git_url(source) => {
            install_cloned(config, source, scope, marketplace_name).await
        }
        Value::Object(spec) => {
            let kind = spec.get("source").and_then(Value::as_str).unwrap_or_default();
            let (target, git_ref) = match kind {
                "github" => (spec.get("repo"), spec.get("ref")),
                "url" | "git" => (spec.get("url"), spec.get("ref")),
                _ => (None, None),
            };
            let target = target.and_then(Value::as_str).filter(|t| !t.is_empty()).ok_or_else(
                || PluginError::SourceMissing {
                    name: plugin_name.to_string(),
                },
            )?;
            let source = match git_ref.and_then(Value::as_str).filter(|r| !r.is_empty()) {
                Some(git_ref) => format!("{target}#{git_ref}"),
                None => target.to_string(),
            };
            install_cloned(config, &source, scope, marketplace_name).await
        }
        other => Err(PluginError::UnsupportedSource {
            source_ref: other.to_string(),
        }),
    }
}

async fn install_cloned(
    config: &Config,
    source: &str,
    scope: Scope,
    marketplace_name: &str,
) -> Result<Plugin, PluginError> {
    let tmp = tempfile::tempdir()?;
    let checkout = tmp.path().join("plugin");
    clone_source(source, &checkout).await?;
    install_plugin_from_path(config, &checkout, scope, marketplace_name).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::new();
        config.cwd = dir.to_path_buf();
        config.global_dir = dir.join("global");
        config
    }

    fn make_marketplace(root: &Path, name: &str, plugins_json: &str) {
        let cp = root.join(PLUGIN_CONFIG_DIR);
        std::fs::create_dir_all(&cp).unwrap();
        std::fs::write(
            cp.join(MARKETPLACE_FILE),
            format!(r#"{{"name": "{name}", "plugins": {plugins_json}}}"#),
        )
        .unwrap();
    }

    #[test]
    fn test_github_ref_detection() {
        assert!(is_github_ref("owner/repo"));
        assert!(is_github_ref("owner/repo#v1"));
        assert!(!is_github_ref("./local/path"));
        assert!(!is_github_ref("/abs/path"));
        assert!(!is_github_ref("https://host/owner/repo"));
        assert!(!is_github_ref("owner/-repo"));
        assert!(!is_github_ref("owner//repo"));
        assert!(!is_github_ref("single"));
    }

    #[test]
    fn test_git_url_detection() {
        assert!(is_git_url("https://example.com/repo.git"));
        assert!(is_git_url("git@example.com:owner/repo"));
        assert!(!is_git_url("owner/repo"));
    }

    #[test]
    fn test_parse_descriptor_filters_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MARKETPLACE_FILE);
        std::fs::write(
            &path,
            r#"{
                "name": "tools",
                "metadata": {"description": "dev tools"},
                "plugins": [
                    {"name": "fmt", "source": "./plugins/fmt"},
                    {"source": "./nameless"},
                    "not-an-object"
                ]
            }"#,
        )
        .unwrap();
        let marketplace = parse_descriptor(&path).unwrap();
        assert_eq!(marketplace.name, "tools");
        assert_eq!(marketplace.description, "dev tools");
        assert_eq!(marketplace.plugins.len(), 1);
        assert_eq!(marketplace.plugins[0].name, "fmt");
    }

    #[test]
    fn test_parse_descriptor_requires_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MARKETPLACE_FILE);
        std::fs::write(&path, r#"{"plugins": []}"#).unwrap();
        assert!(matches!(
            parse_descriptor(&path),
            Err(PluginError::DescriptorInvalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_local_marketplace() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("market-src");
        make_marketplace(&source, "tools", "[]");

        let marketplace = add_marketplace(&config, source.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(marketplace.name, "tools");
        assert_eq!(marketplace.source_type, Some(SourceType::Local));
        assert!(config.marketplace_cache_dir().join("tools").is_dir());

        let listed = list_marketplaces(&config);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "tools");
    }

    #[tokio::test]
    async fn test_add_bare_descriptor_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let path = dir.path().join(MARKETPLACE_FILE);
        std::fs::write(&path, r#"{"name": "solo", "plugins": []}"#).unwrap();

        let marketplace = add_marketplace(&config, path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(marketplace.name, "solo");
        assert!(
            config
                .marketplace_cache_dir()
                .join("solo")
                .join(PLUGIN_CONFIG_DIR)
                .join(MARKETPLACE_FILE)
                .exists()
        );
    }

    #[tokio::test]
    async fn test_add_dir_without_descriptor_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("empty");
        std::fs::create_dir_all(&source).unwrap();
        assert!(matches!(
            add_marketplace(&config, source.to_str().unwrap()).await,
            Err(PluginError::DescriptorMissing { .. })
        ));
        assert!(list_marketplaces(&config).is_empty());
    }

    #[tokio::test]
    async fn test_cloned_repo_without_descriptor_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let repo = dir.path().join("nodesc.git");
        std::fs::create_dir_all(&repo).unwrap();
        let git = |args: &[&str]| {
            let status = std::process::Command::new("git")
                .arg("-C")
                .arg(&repo)
                .args(args)
                .status()
                .unwrap();
            assert!(status.success());
        };
        git(&["init", "--quiet"]);
        std::fs::write(repo.join("README"), "no descriptor here").unwrap();
        git(&["add", "README"]);
        git(&[
            "-c",
            "user.name=t",
            "-c",
            "user.email=t@example.com",
            "commit",
            "--quiet",
            "-m",
            "init",
        ]);

        let url = format!("file://{}", repo.display());
        let result = add_marketplace(&config, &url).await;
        assert!(matches!(result, Err(PluginError::DescriptorMissing { .. })));
        assert!(list_marketplaces(&config).is_empty());
        assert!(!config.marketplace_cache_dir().exists());
    }

    #[tokio::test]
    async fn test_failed_clone_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let missing = dir.path().join("no-such-repo.git");
        let result = add_marketplace(&config, missing.to_str().unwrap()).await;
        assert!(matches!(result, Err(PluginError::CloneFailed { .. })));
        assert!(list_marketplaces(&config).is_empty());
        assert!(!config.marketplace_cache_dir().join("no-such-repo").exists());
    }

    #[tokio::test]
    async fn test_remove_marketplace() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("market-src");
        make_marketplace(&source, "tools", "[]");
        add_marketplace(&config, source.to_str().unwrap())
            .await
            .unwrap();

        assert!(remove_marketplace(&config, "tools").unwrap());
        assert!(!config.marketplace_cache_dir().join("tools").exists());
        assert!(list_marketplaces(&config).is_empty());

        // Unknown names report false.
        assert!(!remove_marketplace(&config, "tools").unwrap());
    }

    #[tokio::test]
    async fn test_update_refetches_local_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("market-src");
        make_marketplace(&source, "tools", "[]");
        add_marketplace(&config, source.to_str().unwrap())
            .await
            .unwrap();

        make_marketplace(&source, "tools", r#"[{"name": "fmt", "source": "./fmt"}]"#);
        let updated = update_marketplace(&config, "tools").await.unwrap();
        assert_eq!(updated.plugins.len(), 1);

        assert!(matches!(
            update_marketplace(&config, "ghost").await,
            Err(PluginError::MarketplaceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_known_marketplace_hints_listed() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.known_marketplaces.insert(
            "community".to_string(),
            serde_json::json!({"source": {"source": "github", "repo": "org/market"}}),
        );

        let listed = list_marketplaces(&config);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "community");
        assert_eq!(listed[0].source_type, Some(SourceType::GitHub));
        assert_eq!(listed[0].source_ref, "org/market");
        assert!(listed[0].local_path.is_none());
    }

    #[tokio::test]
    async fn test_discover_plugins_tags_marketplace() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("market-src");
        make_marketplace(
            &source,
            "tools",
            r#"[{"name": "fmt", "source": "./fmt"}, {"name": "lint", "source": "./lint"}]"#,
        );
        add_marketplace(&config, source.to_str().unwrap())
            .await
            .unwrap();

        let discovered = discover_plugins(&config);
        assert_eq!(discovered.len(), 2);
        assert!(discovered.iter().all(|(m, _)| m == "tools"));
    }

    #[tokio::test]
    async fn test_install_relative_source_from_marketplace() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("market-src");
        make_marketplace(&source, "tools", r#"[{"name": "fmt", "source": "./fmt"}]"#);
        let plugin_src = source.join("fmt").join(PLUGIN_CONFIG_DIR);
        std::fs::create_dir_all(&plugin_src).unwrap();
        std::fs::write(plugin_src.join("plugin.json"), r#"{"name": "fmt"}"#).unwrap();
        add_marketplace(&config, source.to_str().unwrap())
            .await
            .unwrap();

        let plugin = install_from_marketplace(&config, "fmt", "tools", Scope::User)
            .await
            .unwrap();
        assert_eq!(plugin.name, "fmt");
        assert_eq!(plugin.marketplace, "tools");
    }

    #[tokio::test]
    async fn test_install_unknown_plugin_or_marketplace() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        assert!(matches!(
            install_from_marketplace(&config, "fmt", "ghost", Scope::User).await,
            Err(PluginError::MarketplaceNotFound { .. })
        ));

        let source = dir.path().join("market-src");
        make_marketplace(&source, "tools", "[]");
        add_marketplace(&config, source.to_str().unwrap())
            .await
            .unwrap();
        assert!(matches!(
            install_from_marketplace(&config, "fmt", "tools", Scope::User).await,
            Err(PluginError::PluginNotFound { .. })
        ));
    }
}
