//! quire - a documentation site builder
//!
//! Parses content pages (front matter + lightweight markup), renders them
//! to HTML, and writes a static site with weight-ordered section listings.

mod build;
mod cli;
mod config;
mod content;
mod init;
mod logger;
mod render;
mod serve;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        log!("error"; "{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Init { name } => {
            init::new_site(config, name.is_some())?;
            log!("init"; "site created at {}", config.get_root().display());
        }
        Commands::Build { .. } => {
            let pages = build::build_site(config)?;
            log!(
                "build";
                "{} page(s) -> {}",
                pages.len(),
                config.build.output.display()
            );
        }
        Commands::Serve { .. } => {
            build::build_site(config)?;
            serve::serve_site(config)?;
        }
    }

    Ok(())
}

/// Load configuration from `quire.toml`, apply CLI overrides, and leak it
/// for a `'static` lifetime shared across the build workers.
fn load_config(cli: &'static Cli) -> Result<&'static SiteConfig> {
    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
    let config_path = root.join(&cli.config);

    // `init` runs before the config file exists; start from defaults then.
    let mut config = if config_path.is_file() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };

    config.update_with_cli(cli);

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(Box::leak(Box::new(config)))
}
