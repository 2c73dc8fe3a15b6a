//! Plugin system: loading, lifecycle management, and marketplaces.
//!
//! Plugins are directories with a `.claude-plugin/plugin.json` manifest,
//! containing any combination of:
//! - `commands/` — slash command markdown files
//! - `skills/` — skill definitions
//! - `agents/` — subagent definitions
//! - `hooks/hooks.json` — hook configurations
//! - `.mcp.json` — MCP server configurations
//!
//! Installed plugins live in a cache under the global config dir and are
//! toggled through `enabledPlugins` entries in settings files. Marketplaces
//! are git repos or directories carrying a `marketplace.json` catalog that
//! plugins can be installed from.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.claude/plugins/cache/
//! └── my-plugin/
//!     ├── .claude-plugin/
//!     │   ├── plugin.json
//!     │   └── _install_meta.json
//!     ├── commands/
//!     │   └── hello.md
//!     ├── skills/
//!     │   └── commit/
//!     │       └── SKILL.md
//!     ├── agents/
//!     │   └── reviewer.md
//!     ├── hooks/
//!     │   └── hooks.json
//!     └── .mcp.json
//! ```

mod error;
mod lifecycle;
mod loader;
mod manifest;
mod marketplace;

pub use error::PluginError;
pub use lifecycle::{
    disable_plugin, enable_plugin, install_plugin_from_path, is_plugin_enabled, uninstall_plugin,
    update_plugin,
};
pub use loader::{
    Plugin, PluginComponents, list_plugins, load_enabled_plugins, load_plugin, validate_plugin,
};
pub use manifest::{InstallRecord, PLUGIN_CONFIG_DIR, PLUGIN_MANIFEST_FILE, PluginManifest};
pub use marketplace::{
    MARKETPLACE_FILE, Marketplace, MarketplaceEntry, SourceType, add_marketplace,
    discover_plugins, install_from_marketplace, list_marketplaces, remove_marketplace,
    update_marketplace,
};
