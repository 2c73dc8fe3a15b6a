//! Plugin lifecycle: install, uninstall, enable, disable, update.

use std::path::Path;

use chrono::Utc;

use crate::common::fs::replace_dir;
use crate::config::{Config, Scope};

use super::error::PluginError;
use super::loader::{Plugin, load_plugin};
use super::manifest::InstallRecord;

/// Resolve the enabled flag for a plugin.
///
/// The `name@marketplace` key wins over the bare name; a plugin with no
/// entry at all is enabled.
pub fn is_plugin_enabled(config: &Config, name: &str, marketplace: &str) -> bool {
    if !marketplace.is_empty() {
        let key = format!("{name}@{marketplace}");
        if let Some(&enabled) = config.enabled_plugins.get(&key) {
            return enabled;
        }
    }
    config.enabled_plugins.get(name).copied().unwrap_or(true)
}

/// Set, clear (`None`), or overwrite a plugin's enabled flag in the settings
/// file for the given scope, leaving unrelated settings untouched.
async fn set_enabled_plugin(
    config: &Config,
    name: &str,
    value: Option<bool>,
    scope: Scope,
) -> Result<(), PluginError> {
    let path = config.settings_path(scope);
    let mut settings = crate::config::Settings::read(&path).await;
    match value {
        Some(enabled) => {
            settings.enabled_plugins.insert(name.to_string(), enabled);
        }
        None => {
            settings.enabled_plugins.remove(name);
        }
    }
    settings.write(&path).await?;
    Ok(())
}

/// Install a plugin by copying a local directory into the cache.
///
/// Writes the install sidecar, enables the plugin in the given scope under
/// its `name@marketplace` key, and returns the plugin reloaded from cache.
pub async fn install_plugin_from_path(
    config: &Config,
    source_path: &Path,
    scope: Scope,
    marketplace: &str,
) -> Result<Plugin, PluginError> {
    let source_path = source_path
        .canonicalize()
        .map_err(|_| PluginError::DirectoryNotFound {
            path: source_path.to_path_buf(),
        })?;

    let plugin = load_plugin(&source_path, None);
    if let Some(reason) = plugin.error {
        tracing::debug!(reason, "install source failed to load");
        return Err(PluginError::LoadFailed {
            path: source_path,
            reason,
        });
    }

    let name = plugin.manifest.name.clone();
    let dest = config.plugin_cache_dir().join(&name);
    replace_dir(&source_path, &dest)?;

    let record = InstallRecord {
        source: source_path.display().to_string(),
        marketplace: marketplace.to_string(),
        scope: scope.as_str().to_string(),
        installed_at: Some(Utc::now()),
    };
    record.write(&dest)?;

    let key = if marketplace.is_empty() {
        name.clone()
    } else {
        format!("{name}@{marketplace}")
    };
    set_enabled_plugin(config, &key, Some(true), scope).await?;
    tracing::info!(plugin = %name, scope = %scope, "installed plugin");

    let mut installed = load_plugin(&dest, None);
    installed.source = record.source;
    installed.marketplace = marketplace.to_string();
    Ok(installed)
}

/// Remove a plugin's cache entry and its enabled flag. Idempotent.
///
/// Accepts either a bare name or `name@marketplace`; the cache entry lives
/// under the bare name, the settings key under whatever was passed.
pub async fn uninstall_plugin(
    config: &Config,
    name: &str,
    scope: Scope,
) -> Result<(), PluginError> {
    let bare_name = name.split('@').next().unwrap_or(name);
    let dest = config.plugin_cache_dir().join(bare_name);
    if dest.exists() {
        std::fs::remove_dir_all(&dest)?;
    }
    set_enabled_plugin(config, name, None, scope).await?;
    tracing::info!(plugin = %name, scope = %scope, "uninstalled plugin");
    Ok(())
}

pub async fn enable_plugin(config: &Config, name: &str, scope: Scope) -> Result<(), PluginError> {
    set_enabled_plugin(config, name, Some(true), scope).await
}

pub async fn disable_plugin(config: &Config, name: &str, scope: Scope) -> Result<(), PluginError> {
    set_enabled_plugin(config, name, Some(false), scope).await
}

/// Reinstall a plugin from its recorded source.
///
/// Returns `Ok(None)` when the plugin has no install sidecar or its source
/// directory no longer exists.
pub async fn update_plugin(config: &Config, name: &str) -> Result<Option<Plugin>, PluginError> {
    let bare_name = name.split('@').next().unwrap_or(name);
    let cached = config.plugin_cache_dir().join(bare_name);
    let Some(record) = InstallRecord::read(&cached) else {
        return Ok(None);
    };
    let source = Path::new(&record.source);
    if record.source.is_empty() || !source.is_dir() {
        return Ok(None);
    }
    let scope = record.scope.parse().unwrap_or(Scope::User);
    let plugin =
        install_plugin_from_path(config, source, scope, &record.marketplace).await?;
    Ok(Some(plugin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::plugins::list_plugins;
    use crate::plugins::manifest::{PLUGIN_CONFIG_DIR, PLUGIN_MANIFEST_FILE};

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::new();
        config.cwd = dir.to_path_buf();
        config.global_dir = dir.join("global");
        config
    }

    fn make_plugin(root: &Path, name: &str) {
        let cp = root.join(PLUGIN_CONFIG_DIR);
        std::fs::create_dir_all(&cp).unwrap();
        std::fs::write(
            cp.join(PLUGIN_MANIFEST_FILE),
            format!(r#"{{"name": "{name}"}}"#),
        )
        .unwrap();
        std::fs::create_dir_all(root.join("commands")).unwrap();
        std::fs::write(root.join("commands").join("run.md"), "# run").unwrap();
    }

    #[tokio::test]
    async fn test_install_copies_and_enables() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("src-plugin");
        make_plugin(&source, "fmt");

        let plugin = install_plugin_from_path(&config, &source, Scope::User, "")
            .await
            .unwrap();
        assert_eq!(plugin.name, "fmt");
        assert_eq!(plugin.root, config.plugin_cache_dir().join("fmt"));
        assert_eq!(plugin.components.command_dirs.len(), 1);

        let settings = Settings::read(&config.settings_path(Scope::User)).await;
        assert_eq!(settings.enabled_plugins.get("fmt"), Some(&true));

        let record = InstallRecord::read(&plugin.root).unwrap();
        assert_eq!(record.scope, "user");
        assert!(record.installed_at.is_some());
    }

    #[tokio::test]
    async fn test_install_with_marketplace_uses_qualified_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("src-plugin");
        make_plugin(&source, "fmt");

        install_plugin_from_path(&config, &source, Scope::User, "tools")
            .await
            .unwrap();
        let settings = Settings::read(&config.settings_path(Scope::User)).await;
        assert_eq!(settings.enabled_plugins.get("fmt@tools"), Some(&true));
    }

    #[tokio::test]
    async fn test_install_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let result =
            install_plugin_from_path(&config, &dir.path().join("absent"), Scope::User, "").await;
        assert!(matches!(result, Err(PluginError::DirectoryNotFound { .. })));
        assert!(!config.plugin_cache_dir().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_broken_source_reports_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("src-plugin");
        let cp = source.join(PLUGIN_CONFIG_DIR);
        std::fs::create_dir_all(&cp).unwrap();
        std::fs::write(
            cp.join(PLUGIN_MANIFEST_FILE),
            r#"{"name": "p", "hooks": "my-hooks"}"#,
        )
        .unwrap();
        // The declared hooks path is a directory, so the loader fails on it.
        std::fs::create_dir_all(source.join("my-hooks")).unwrap();

        let result = install_plugin_from_path(&config, &source, Scope::User, "").await;
        match result {
            Err(PluginError::LoadFailed { path, reason }) => {
                assert_eq!(path, source.canonicalize().unwrap());
                assert!(!reason.is_empty());
            }
            other => panic!("expected LoadFailed, got {other:?}"),
        }
        assert!(!config.plugin_cache_dir().exists());
    }

    #[tokio::test]
    async fn test_reinstall_replaces_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("src-plugin");
        make_plugin(&source, "fmt");
        install_plugin_from_path(&config, &source, Scope::User, "")
            .await
            .unwrap();

        std::fs::remove_dir_all(source.join("commands")).unwrap();
        std::fs::create_dir_all(source.join("skills")).unwrap();
        let plugin = install_plugin_from_path(&config, &source, Scope::User, "")
            .await
            .unwrap();
        assert!(plugin.components.command_dirs.is_empty());
        assert_eq!(plugin.components.skill_dirs.len(), 1);
    }

    #[tokio::test]
    async fn test_uninstall_round_trip_and_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("src-plugin");
        make_plugin(&source, "fmt");
        install_plugin_from_path(&config, &source, Scope::User, "")
            .await
            .unwrap();

        uninstall_plugin(&config, "fmt", Scope::User).await.unwrap();
        assert!(list_plugins(&config).is_empty());
        let settings = Settings::read(&config.settings_path(Scope::User)).await;
        assert!(settings.enabled_plugins.is_empty());

        // Second uninstall of the same name is a no-op.
        uninstall_plugin(&config, "fmt", Scope::User).await.unwrap();
    }

    #[tokio::test]
    async fn test_uninstall_qualified_name_strips_suffix_for_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("src-plugin");
        make_plugin(&source, "fmt");
        install_plugin_from_path(&config, &source, Scope::User, "tools")
            .await
            .unwrap();

        uninstall_plugin(&config, "fmt@tools", Scope::User)
            .await
            .unwrap();
        assert!(!config.plugin_cache_dir().join("fmt").exists());
        let settings = Settings::read(&config.settings_path(Scope::User)).await;
        assert!(settings.enabled_plugins.is_empty());
    }

    #[tokio::test]
    async fn test_enable_disable_switch_flag() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        disable_plugin(&config, "fmt", Scope::Project).await.unwrap();
        let path = config.settings_path(Scope::Project);
        assert_eq!(
            Settings::read(&path).await.enabled_plugins.get("fmt"),
            Some(&false)
        );
        enable_plugin(&config, "fmt", Scope::Project).await.unwrap();
        assert_eq!(
            Settings::read(&path).await.enabled_plugins.get("fmt"),
            Some(&true)
        );
    }

    #[tokio::test]
    async fn test_flag_write_preserves_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let path = config.settings_path(Scope::User);
        let settings: Settings =
            serde_json::from_str(r#"{"model": "m", "customKey": 42}"#).unwrap();
        settings.write(&path).await.unwrap();

        enable_plugin(&config, "fmt", Scope::User).await.unwrap();
        let back = Settings::read(&path).await;
        assert_eq!(back.model.as_deref(), Some("m"));
        assert_eq!(back.extra.get("customKey"), Some(&serde_json::json!(42)));
    }

    #[test]
    fn test_is_plugin_enabled_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        assert!(is_plugin_enabled(&config, "fmt", ""));
        assert!(is_plugin_enabled(&config, "fmt", "tools"));

        config.enabled_plugins.insert("fmt".to_string(), false);
        assert!(!is_plugin_enabled(&config, "fmt", "tools"));

        // Qualified key overrides the bare one.
        config.enabled_plugins.insert("fmt@tools".to_string(), true);
        assert!(is_plugin_enabled(&config, "fmt", "tools"));
        assert!(!is_plugin_enabled(&config, "fmt", ""));
    }

    #[tokio::test]
    async fn test_update_reinstalls_from_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("src-plugin");
        make_plugin(&source, "fmt");
        install_plugin_from_path(&config, &source, Scope::User, "")
            .await
            .unwrap();

        std::fs::create_dir_all(source.join("agents")).unwrap();
        let updated = update_plugin(&config, "fmt").await.unwrap().unwrap();
        assert_eq!(updated.components.agent_dirs.len(), 1);
    }

    #[tokio::test]
    async fn test_update_without_sidecar_or_source_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        assert!(update_plugin(&config, "ghost").await.unwrap().is_none());

        let source = dir.path().join("src-plugin");
        make_plugin(&source, "fmt");
        install_plugin_from_path(&config, &source, Scope::User, "")
            .await
            .unwrap();
        std::fs::remove_dir_all(&source).unwrap();
        assert!(update_plugin(&config, "fmt").await.unwrap().is_none());
    }
}
