//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `scan`: Run the inventory pipeline over one or more roots
//! - `config`: Show, locate or initialise the config file

mod config;
mod scan;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use config::cmd_config;
pub use scan::{ScanArgs, cmd_scan};

/// Music Inventory CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "MUSIC_INVENTORY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Inventory media files under one or more root directories
    Scan(ScanArgs),
    /// Print the effective configuration
    Config {
        /// Print only the config file path
        #[arg(long)]
        path: bool,
        /// Write the default configuration if no config file exists
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Scan(args) => cmd_scan(cli.config.as_ref(), args),
        Commands::Config { path, init } => cmd_config(cli.config.as_ref(), *path, *init),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load the config file, from `explicit` if given.
pub(crate) fn load_config(explicit: Option<&PathBuf>) -> crate::config::Config {
    match explicit {
        Some(path) => crate::config::load_from(path),
        None => crate::config::load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from([
            "music-inventory",
            "scan",
            "/music/a",
            "/music/b",
            "-o",
            "out.csv",
            "-w",
            "4",
            "--ext",
            "flac",
        ])
        .unwrap();
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.roots.len(), 2);
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        assert_eq!(args.workers, Some(4));
        assert_eq!(args.ext, vec!["flac".to_string()]);
    }

    #[test]
    fn test_parse_config_flags() {
        let cli = Cli::try_parse_from(["music-inventory", "--config", "/tmp/c.toml", "config", "--path"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Config { path: true, init: false }));
    }

    #[test]
    fn test_no_subcommand_is_error() {
        assert!(Cli::try_parse_from(["music-inventory"]).is_err());
    }
}
