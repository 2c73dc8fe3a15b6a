//! Command-line interface for managing plugins and marketplaces.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use claude_extensions::plugins::{
    self, Plugin, add_marketplace, discover_plugins, install_from_marketplace, list_marketplaces,
    list_plugins, remove_marketplace, update_marketplace, validate_plugin,
};
use claude_extensions::{Scope, load_config};

#[derive(Parser)]
#[command(name = "cx-plugin", version, about = "Manage plugins and marketplaces")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Install, remove, and inspect plugins.
    #[command(subcommand)]
    Plugin(PluginCommand),
    /// Manage plugin marketplaces.
    #[command(subcommand)]
    Marketplace(MarketplaceCommand),
}

#[derive(Subcommand)]
enum PluginCommand {
    /// Install a plugin from a local path or `name@marketplace`.
    Install {
        target: String,
        #[arg(long, default_value = "user")]
        scope: Scope,
    },
    /// Remove an installed plugin.
    #[command(alias = "remove", alias = "rm")]
    Uninstall {
        name: String,
        #[arg(long, default_value = "user")]
        scope: Scope,
    },
    /// Turn an installed plugin on.
    Enable {
        name: String,
        #[arg(long, default_value = "user")]
        scope: Scope,
    },
    /// Turn an installed plugin off without removing it.
    Disable {
        name: String,
        #[arg(long, default_value = "user")]
        scope: Scope,
    },
    /// Reinstall a plugin from its original source.
    Update { name: String },
    /// List installed plugins.
    List,
    /// Check a plugin directory's structure.
    Validate { path: PathBuf },
    /// List plugins available from registered marketplaces.
    Discover,
}

#[derive(Subcommand)]
enum MarketplaceCommand {
    /// Register a marketplace from a path, GitHub shorthand, or git URL.
    Add { source: String },
    /// Unregister a marketplace and delete its cache.
    Remove { name: String },
    /// Re-fetch a marketplace from its recorded source.
    Update { name: String },
    /// List registered marketplaces.
    List,
}

fn describe(plugin: &Plugin) -> String {
    let mut line = plugin.name.clone();
    if !plugin.manifest.version.is_empty() {
        line.push_str(&format!(" v{}", plugin.manifest.version));
    }
    if !plugin.marketplace.is_empty() {
        line.push_str(&format!(" (from {})", plugin.marketplace));
    }
    if !plugin.enabled {
        line.push_str(" [disabled]");
    }
    if let Some(error) = &plugin.error {
        line.push_str(&format!(" [broken: {error}]"));
    }
    line
}

async fn run_plugin(command: PluginCommand) -> Result<(), String> {
    let config = load_config().await;
    match command {
        PluginCommand::Install { target, scope } => {
            let plugin = if target.contains('@') && !Path::new(&target).exists() {
                let (name, marketplace) = target.split_once('@').unwrap_or((target.as_str(), ""));
                install_from_marketplace(&config, name, marketplace, scope)
                    .await
                    .map_err(|e| e.to_string())?
            } else {
                let path = Path::new(&target);
                if !path.is_dir() {
                    return Err(format!("not a directory: {target}"));
                }
                plugins::install_plugin_from_path(&config, path, scope, "")
                    .await
                    .map_err(|e| e.to_string())?
            };
            println!("installed {}", plugin.name);
        }
        PluginCommand::Uninstall { name, scope } => {
            plugins::uninstall_plugin(&config, &name, scope)
                .await
                .map_err(|e| e.to_string())?;
            println!("uninstalled {name}");
        }
        PluginCommand::Enable { name, scope } => {
            plugins::enable_plugin(&config, &name, scope)
                .await
                .map_err(|e| e.to_string())?;
            println!("enabled {name}");
        }
        PluginCommand::Disable { name, scope } => {
            plugins::disable_plugin(&config, &name, scope)
                .await
                .map_err(|e| e.to_string())?;
            println!("disabled {name}");
        }
        PluginCommand::Update { name } => {
            match plugins::update_plugin(&config, &name)
                .await
                .map_err(|e| e.to_string())?
            {
                Some(plugin) => println!("updated {}", plugin.name),
                None => return Err(format!("cannot update '{name}': no recorded source")),
            }
        }
        PluginCommand::List => {
            let plugins = list_plugins(&config);
            if plugins.is_empty() {
                println!("no plugins installed");
            }
            for plugin in &plugins {
                println!("{}", describe(plugin));
                if !plugin.manifest.description.is_empty() {
                    println!("  {}", plugin.manifest.description);
                }
            }
        }
        PluginCommand::Validate { path } => {
            let problems = validate_plugin(&path);
            if problems.is_empty() {
                println!("plugin is valid");
            } else {
                for problem in &problems {
                    println!("{problem}");
                }
                return Err(format!("{} problem(s) found", problems.len()));
            }
        }
        PluginCommand::Discover => {
            let entries = discover_plugins(&config);
            if entries.is_empty() {
                println!("no plugins available; add a marketplace first");
            }
            for (marketplace, entry) in &entries {
                if entry.description.is_empty() {
                    println!("{}@{marketplace}", entry.name);
                } else {
                    println!("{}@{marketplace} - {}", entry.name, entry.description);
                }
            }
        }
    }
    Ok(())
}

async fn run_marketplace(command: MarketplaceCommand) -> Result<(), String> {
    let config = load_config().await;
    match command {
        MarketplaceCommand::Add { source } => {
            let marketplace = add_marketplace(&config, &source)
                .await
                .map_err(|e| e.to_string())?;
            println!(
                "added marketplace {} ({} plugins)",
                marketplace.name,
                marketplace.plugins.len()
            );
        }
        MarketplaceCommand::Remove { name } => {
            if remove_marketplace(&config, &name).map_err(|e| e.to_string())? {
                println!("removed marketplace {name}");
            } else {
                return Err(format!("marketplace '{name}' not found"));
            }
        }
        MarketplaceCommand::Update { name } => {
            let marketplace = update_marketplace(&config, &name)
                .await
                .map_err(|e| e.to_string())?;
            println!(
                "updated marketplace {} ({} plugins)",
                marketplace.name,
                marketplace.plugins.len()
            );
        }
        MarketplaceCommand::List => {
            let marketplaces = list_marketplaces(&config);
            if marketplaces.is_empty() {
                println!("no marketplaces registered");
            }
            for marketplace in &marketplaces {
                let kind = marketplace
                    .source_type
                    .map(|t| t.as_str())
                    .unwrap_or("unknown");
                println!(
                    "{} [{kind}] {} - {} plugin(s)",
                    marketplace.name,
                    marketplace.source_ref,
                    marketplace.plugins.len()
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Plugin(command) => run_plugin(command).await,
        Command::Marketplace(command) => run_marketplace(command).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
