//! Extractor workers: hash, tag-parse and checksum one file at a time.
//!
//! Every step of [`Extractor::process`] is attempted once and is independent
//! of the others' success, except the audio checksum which needs recognized
//! tags first. A failed step is logged with the file path, its field is left
//! blank, and the record is still forwarded to the sink.

use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::config::InventoryConfig;
use crate::hash;
use crate::metadata;
use crate::model::FileRecord;

/// Failure counters shared by all workers of a run.
#[derive(Debug, Default)]
pub struct ExtractStats {
    pub processed: AtomicUsize,
    pub hash_failures: AtomicUsize,
    pub tag_failures: AtomicUsize,
    pub checksum_failures: AtomicUsize,
}

impl ExtractStats {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// One extractor worker.
#[derive(Clone)]
pub struct Extractor {
    config: Arc<InventoryConfig>,
    stats: Arc<ExtractStats>,
}

impl Extractor {
    pub fn new(config: Arc<InventoryConfig>, stats: Arc<ExtractStats>) -> Self {
        Self { config, stats }
    }

    /// Drain `rx` until it is closed and empty, forwarding every record.
    ///
    /// Returns the number of records this worker handled.
    pub fn run(&self, rx: Receiver<FileRecord>, tx: Sender<FileRecord>) -> usize {
        let mut handled = 0;
        for record in rx.iter() {
            let record = self.process(record);
            handled += 1;
            if tx.send(record).is_err() {
                warn!("Record queue closed, worker stopping");
                break;
            }
        }
        handled
    }

    /// Enrich a scanned record. Never fails; failed fields stay empty.
    pub fn process(&self, mut record: FileRecord) -> FileRecord {
        debug!(path = %record.path.display(), "Processing");

        match hash::full_hash(&record.path) {
            Ok(h) => record.full_hash = h,
            Err(e) => {
                warn!(path = %record.path.display(), error = %e, "FAILED to hash");
                ExtractStats::bump(&self.stats.hash_failures);
            }
        }

        if !self.config.is_tag_exempt(&record.extension) {
            match metadata::read_tags(&record.path, &record.extension) {
                Ok(Some(tags)) => record.tags = tags,
                Ok(None) => {
                    debug!(path = %record.path.display(), "No recognized tags");
                }
                Err(e) => {
                    warn!(path = %record.path.display(), error = %e, "FAILED to read metadata");
                    ExtractStats::bump(&self.stats.tag_failures);
                }
            }
        }

        if record.has_recognized_tags() {
            match hash::audio::audio_checksum(&record.path) {
                Ok(sum) => record.audio_checksum = sum,
                Err(e) => {
                    warn!(path = %record.path.display(), error = %e, "FAILED to checksum audio content");
                    ExtractStats::bump(&self.stats.checksum_failures);
                }
            }
        }

        ExtractStats::bump(&self.stats.processed);
        record
    }
}
