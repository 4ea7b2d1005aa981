//! stancache - compiled Stan model cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use stancache::cli::{commands, Cli, Commands};
use stancache::config::{resolve_cache_dir, Config, ConfigManager};
use stancache::error::StanCacheResult;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> StanCacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load()?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("stancache=warn"),
        1 => EnvFilter::new("stancache=info"),
        _ => EnvFilter::new("stancache=debug"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    debug!("Using config {}", config_manager.path().display());

    let flag = cli.cache_dir.as_deref();
    match cli.command {
        Commands::Fingerprint(args) => commands::fingerprint(args),
        Commands::Config(args) => commands::config(args, &config, &config_manager),
        Commands::Build(args) => commands::build(args, &config, &cache_dir(flag, &config)?),
        Commands::List(args) => commands::list(args, &config, &cache_dir(flag, &config)?),
        Commands::Clean(args) => commands::clean(args, &config, &cache_dir(flag, &config)?),
        Commands::Path => {
            println!("{}", cache_dir(flag, &config)?.display());
            Ok(())
        }
    }
}

/// Resolve the cache directory for commands that use it
fn cache_dir(flag: Option<&Path>, config: &Config) -> StanCacheResult<PathBuf> {
    let dir = resolve_cache_dir(flag, config)?;
    debug!("Cache directory: {}", dir.display());
    Ok(dir)
}
