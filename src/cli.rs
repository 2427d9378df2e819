//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quire documentation site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: quire.toml)
    #[arg(short = 'C', long, default_value = "quire.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared build arguments for Build and Serve commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Clean output directory completely before building
    #[arg(long)]
    pub clean: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Override base URL for the site.
    ///
    /// Useful for CI/CD deployments where the production URL differs from
    /// local development, without modifying quire.toml.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a template site
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Build the site from content pages
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build the site and serve it locally
    Serve {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }

    /// Shared build arguments, if the command carries them.
    pub const fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Build { build_args } | Commands::Serve { build_args, .. } => {
                Some(build_args)
            }
            Commands::Init { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["quire", "build", "--clean"]);
        assert!(!cli.is_init());
        assert!(cli.build_args().unwrap().clean);
    }

    #[test]
    fn test_parse_serve_with_port() {
        let cli = Cli::parse_from(["quire", "serve", "--port", "3000"]);
        let Commands::Serve { port, .. } = &cli.command else {
            panic!("expected serve");
        };
        assert_eq!(*port, Some(3000));
    }

    #[test]
    fn test_parse_init_name() {
        let cli = Cli::parse_from(["quire", "init", "my-docs"]);
        assert!(cli.is_init());
        assert!(cli.build_args().is_none());
    }

    #[test]
    fn test_minify_flag_forms() {
        let cli = Cli::parse_from(["quire", "build", "--minify"]);
        assert_eq!(cli.build_args().unwrap().minify, Some(true));

        let cli = Cli::parse_from(["quire", "build", "--minify", "false"]);
        assert_eq!(cli.build_args().unwrap().minify, Some(false));

        let cli = Cli::parse_from(["quire", "build"]);
        assert_eq!(cli.build_args().unwrap().minify, None);
    }
}
