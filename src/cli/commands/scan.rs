//! The inventory scan command.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, InventoryConfig};
use crate::pipeline;

/// Arguments of `music-inventory scan`. Unset flags fall back to the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Root directories to walk
    pub roots: Vec<PathBuf>,
    /// Output CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Number of extractor workers
    #[arg(short, long)]
    pub workers: Option<usize>,
    /// Capacity of each queue between stages
    #[arg(long)]
    pub queue_capacity: Option<usize>,
    /// Extension to include (repeatable, replaces the configured list)
    #[arg(long = "ext")]
    pub ext: Vec<String>,
    /// Extension exempt from tag parsing (repeatable, replaces the configured list)
    #[arg(long)]
    pub tag_exempt: Vec<String>,
    /// Rows between progress lines
    #[arg(long)]
    pub progress_interval: Option<usize>,
}

impl ScanArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, mut config: Config) -> Config {
        if !self.roots.is_empty() {
            config.roots = self.roots.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(cap) = self.queue_capacity {
            config.queue_capacity = cap;
        }
        if !self.ext.is_empty() {
            config.extensions = self.ext.clone();
        }
        if !self.tag_exempt.is_empty() {
            config.tag_exempt = self.tag_exempt.clone();
        }
        if let Some(n) = self.progress_interval {
            config.progress_interval = n;
        }
        config
    }
}

/// Inventory the configured roots into the output CSV
pub fn cmd_scan(config_path: Option<&PathBuf>, args: &ScanArgs) -> anyhow::Result<()> {
    let config = args.apply(super::load_config(config_path));
    let config = Arc::new(InventoryConfig::from_config(config)?);

    for root in &config.roots {
        println!("Scanning directory: {}", root.display());
    }
    info!(workers = config.workers, output = %config.output.display(), "Starting inventory");

    let summary = pipeline::run(Arc::clone(&config))?;

    println!(
        "Found {} files in {} roots ({} failed)",
        summary.files_found,
        summary.roots_scanned + summary.roots_failed,
        summary.roots_failed
    );
    println!(
        "Processed {} files ({} hash, {} tag, {} checksum failures)",
        summary.records_processed,
        summary.hash_failures,
        summary.tag_failures,
        summary.checksum_failures
    );
    println!(
        "Wrote {} rows to {} ({} failed)",
        summary.records_written,
        config.output.display(),
        summary.write_failures
    );
    println!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_mp3;
    use tempfile::tempdir;

    #[test]
    fn test_apply_overrides_only_given_flags() {
        let base = Config {
            roots: vec![PathBuf::from("/from-file")],
            workers: 2,
            ..Config::default()
        };
        let args = ScanArgs {
            output: Some(PathBuf::from("out.csv")),
            ext: vec![".flac".into()],
            ..ScanArgs::default()
        };

        let merged = args.apply(base);
        assert_eq!(merged.roots, vec![PathBuf::from("/from-file")]);
        assert_eq!(merged.workers, 2);
        assert_eq!(merged.output, PathBuf::from("out.csv"));
        assert_eq!(merged.extensions, vec![".flac".to_string()]);
        assert_eq!(merged.tag_exempt, vec![".wma".to_string()]);
    }

    #[test]
    fn test_cmd_scan_writes_output() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("library");
        std::fs::create_dir(&root).unwrap();
        write_mp3(&root, "a.mp3", &[("TIT2", "Song A")], 0x55);
        let config_file = dir.path().join("absent.toml");

        let args = ScanArgs {
            roots: vec![root],
            output: Some(dir.path().join("files.csv")),
            workers: Some(2),
            ..ScanArgs::default()
        };
        cmd_scan(Some(&config_file), &args).unwrap();
        assert!(dir.path().join("files.csv").exists());
    }

    #[test]
    fn test_cmd_scan_without_roots_fails() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("absent.toml");
        let err = cmd_scan(Some(&config_file), &ScanArgs::default()).unwrap_err();
        assert!(err.to_string().contains("no root"));
    }
}
