//! # claude-extensions
//!
//! Extensibility and policy-control layer for Claude-style coding agents:
//! lifecycle hooks that intercept every tool invocation, and a plugin system
//! for installing, enabling, and distributing extension bundles.
//!
//! ## Hook pipeline
//!
//! ```rust,no_run
//! use claude_extensions::config::load_config;
//! use claude_extensions::hooks::{HookEvent, HookVariables, execute};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), claude_extensions::Error> {
//!     let config = load_config().await;
//!     let vars = HookVariables::for_tool("Write", Some("src/main.rs"));
//!     let outcome = execute(&config.hooks, HookEvent::PreToolUse, "Write", &vars).await;
//!     if outcome.permission.is_deny() {
//!         println!("blocked: {}", outcome.reason);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Plugins
//!
//! Plugins are directories with a `.claude-plugin/plugin.json` manifest,
//! installed into a per-user cache and toggled through scoped settings
//! files. Marketplaces are git-fetched registries of installable plugins.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod common;
pub mod config;
pub mod hooks;
pub mod plugins;

pub use config::{Config, Scope, Settings, load_config};
pub use hooks::{
    HookDefinition, HookEvent, HookKind, HookMiddleware, HookOutcome, HookRegistry, HookRule,
    HookVariables, PermissionDecision, StopDecision, execute,
};
pub use plugins::{
    InstallRecord, Marketplace, MarketplaceEntry, Plugin, PluginComponents, PluginError,
    PluginManifest, SourceType,
};

/// Error type for claude-extensions operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Plugin or marketplace operation failed.
    #[error(transparent)]
    Plugin(#[from] plugins::PluginError),
}

/// Result type alias for claude-extensions operations.
pub type Result<T> = std::result::Result<T, Error>;
