//! The single CSV writer at the end of the pipeline.
//!
//! Rows appear in arrival order, which depends on worker timing; nothing
//! downstream may rely on it.

use crossbeam_channel::Receiver;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::model::FileRecord;

/// Totals reported once the sink has drained its queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub written: usize,
    pub write_failures: usize,
    pub flushed: bool,
}

/// CSV output table.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    progress_interval: usize,
    summary: SinkSummary,
}

impl CsvSink {
    /// Create the output file. The table has no header row; columns are
    /// positional in [`crate::model::COLUMNS`] order.
    ///
    /// This is the one failure that ends a run.
    pub fn create(path: &Path, progress_interval: usize) -> Result<Self> {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| Error::output(path, e))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            progress_interval: progress_interval.max(1),
            summary: SinkSummary::default(),
        })
    }

    /// Append one record. A failed row is logged and counted.
    pub fn write(&mut self, record: &FileRecord) {
        if let Err(e) = self.writer.write_record(record.to_row()) {
            warn!(path = %record.path.display(), error = %e, "FAILED to write row");
            self.summary.write_failures += 1;
            return;
        }

        self.summary.written += 1;
        if self.summary.written % self.progress_interval == 0 {
            info!(written = self.summary.written, "Progress");
        }
    }

    /// Drain `rx` until it is closed and empty, then flush.
    pub fn run(mut self, rx: Receiver<FileRecord>) -> SinkSummary {
        for record in rx.iter() {
            self.write(&record);
        }
        self.finish()
    }

    /// Flush buffered rows and report totals.
    pub fn finish(mut self) -> SinkSummary {
        info!(written = self.summary.written, output = %self.path.display(), "Total");
        match self.writer.flush() {
            Ok(()) => self.summary.flushed = true,
            Err(e) => {
                error!(output = %self.path.display(), error = %e, "FAILED to flush output");
            }
        }
        self.summary
    }
}
