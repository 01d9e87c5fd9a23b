//! Config file inspection.

use anyhow::Context;
use std::path::PathBuf;

use crate::config::{self, Config};

/// Print the effective config, its path, or seed it with defaults
pub fn cmd_config(explicit: Option<&PathBuf>, path_only: bool, init: bool) -> anyhow::Result<()> {
    let path = match explicit {
        Some(p) => p.clone(),
        None => config::config_path().context("Could not determine config directory")?,
    };

    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            config::save_to(&Config::default(), &path)?;
            println!("Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    let effective = config::load_from(&path);
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}
