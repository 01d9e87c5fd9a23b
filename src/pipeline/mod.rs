//! Orchestration of the scan → extract → sink pipeline.
//!
//! ```text
//!  scan-0 ─┐                    ┌─ extract-0 ─┐
//!  scan-1 ─┼─▶ [scan queue] ───▶┼─ extract-1 ─┼─▶ [record queue] ─▶ sink ─▶ CSV
//!  scan-N ─┘    (bounded)       └─ extract-M ─┘      (bounded)
//! ```
//!
//! Shutdown runs in strict phases. The orchestrator keeps its own sender of
//! each queue until every producer of that queue has been joined, so a queue
//! is never closed while something might still write to it:
//!
//! 1. `Scanning`: join every scanner, then drop the scan sender
//! 2. `Extracting`: join every extractor, then drop the record sender
//! 3. `Sinking`: join the sink
//! 4. `Done`

use crossbeam_channel::bounded;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

use crate::config::InventoryConfig;
use crate::error::{Result, ResultExt};
use crate::extractor::{ExtractStats, Extractor};
use crate::model::FileRecord;
use crate::scanner;
use crate::sink::{CsvSink, SinkSummary};

/// Pipeline phase, advanced strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Scanning,
    Extracting,
    Sinking,
    Done,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub phase: Phase,
    pub roots_scanned: usize,
    pub roots_failed: usize,
    pub files_found: usize,
    pub records_processed: usize,
    pub records_written: usize,
    pub write_failures: usize,
    pub hash_failures: usize,
    pub tag_failures: usize,
    pub checksum_failures: usize,
}

/// Run the whole inventory.
///
/// Per-file and per-root failures are logged and counted; only a failure to
/// create the output table (or to start threads) is returned as an error.
pub fn run(config: Arc<InventoryConfig>) -> Result<RunSummary> {
    let sink = CsvSink::create(&config.output, config.progress_interval)?;

    let (scan_tx, scan_rx) = bounded::<FileRecord>(config.queue_capacity);
    let (record_tx, record_rx) = bounded::<FileRecord>(config.queue_capacity);

    let sink_handle = thread::Builder::new()
        .name("sink".to_string())
        .spawn(move || sink.run(record_rx))
        .with_context("spawning sink thread")?;

    let stats = Arc::new(ExtractStats::default());
    let mut extract_handles = Vec::with_capacity(config.workers);
    for i in 0..config.workers {
        let extractor = Extractor::new(Arc::clone(&config), Arc::clone(&stats));
        let rx = scan_rx.clone();
        let tx = record_tx.clone();
        let handle = thread::Builder::new()
            .name(format!("extract-{i}"))
            .spawn(move || extractor.run(rx, tx))
            .with_context("spawning extractor thread")?;
        extract_handles.push(handle);
    }
    drop(scan_rx);

    let mut scan_handles = Vec::with_capacity(config.roots.len());
    for (i, root) in config.roots.iter().enumerate() {
        let walk_root = root.clone();
        let cfg = Arc::clone(&config);
        let tx = scan_tx.clone();
        let handle = thread::Builder::new()
            .name(format!("scan-{i}"))
            .spawn(move || scanner::scan_root(&walk_root, &cfg, &tx))
            .with_context("spawning scanner thread")?;
        scan_handles.push((root.clone(), handle));
    }

    // Phase 1: every root has finished producing.
    let mut phase = Phase::Scanning;
    info!(?phase, roots = scan_handles.len(), "Scanning");
    let (roots_scanned, roots_failed, files_found) = join_scanners(scan_handles);
    drop(scan_tx);
    info!(files_found, roots_failed, "Found all files");

    // Phase 2: every worker has drained the scan queue.
    phase = Phase::Extracting;
    info!(?phase, workers = extract_handles.len(), "Extracting");
    let records_processed = join_extractors(extract_handles);
    drop(record_tx);
    info!(records_processed, "Processed all files");

    // Phase 3: the sink has drained and flushed.
    phase = Phase::Sinking;
    info!(?phase, "Sinking");
    let sink_summary = join_sink(sink_handle);
    info!(written = sink_summary.written, "Wrote all output");

    phase = Phase::Done;
    info!(?phase, "Done");

    Ok(RunSummary {
        phase,
        roots_scanned,
        roots_failed,
        files_found,
        records_processed,
        records_written: sink_summary.written,
        write_failures: sink_summary.write_failures,
        hash_failures: stats.hash_failures.load(Ordering::Relaxed),
        tag_failures: stats.tag_failures.load(Ordering::Relaxed),
        checksum_failures: stats.checksum_failures.load(Ordering::Relaxed),
    })
}

/// Join scanner threads; a failed root is logged and counted, never fatal.
fn join_scanners(handles: Vec<(PathBuf, JoinHandle<Result<usize>>)>) -> (usize, usize, usize) {
    let (mut scanned, mut failed, mut found) = (0, 0, 0);
    for (root, handle) in handles {
        match handle.join() {
            Ok(Ok(n)) => {
                scanned += 1;
                found += n;
            }
            Ok(Err(e)) => {
                warn!(root = %root.display(), error = %e, "FAILED to walk");
                failed += 1;
            }
            Err(_) => {
                error!(root = %root.display(), "Scanner thread panicked");
                failed += 1;
            }
        }
    }
    (scanned, failed, found)
}

fn join_extractors(handles: Vec<JoinHandle<usize>>) -> usize {
    handles
        .into_iter()
        .map(|h| match h.join() {
            Ok(n) => n,
            Err(_) => {
                error!("Extractor thread panicked");
                0
            }
        })
        .sum()
}

fn join_sink(handle: JoinHandle<SinkSummary>) -> SinkSummary {
    handle.join().unwrap_or_else(|_| {
        error!("Sink thread panicked");
        SinkSummary::default()
    })
}
