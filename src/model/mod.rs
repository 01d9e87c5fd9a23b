//! Core data model for the inventory pipeline.
//!
//! A [`FileRecord`] is created by a scanner with only its identity fields
//! set, moved through the extract queue to exactly one extractor worker,
//! enriched there, and finally moved to the sink which writes and drops it.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::SystemTime;

/// Column names of the output table, in order. The table itself carries no
/// header row.
pub const COLUMNS: [&str; 19] = [
    "path",
    "extension",
    "size",
    "mod_time",
    "full_hash",
    "audio_checksum",
    "format",
    "file_type",
    "title",
    "album",
    "album_artist",
    "artist",
    "composer",
    "genre",
    "year",
    "track_number",
    "track_total",
    "disk_number",
    "disk_total",
];

/// Timestamp layout of the `mod_time` column, e.g. `2024-03-01 17:04:09.120 +0100`.
const MOD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %z";

/// Descriptive tag fields. Everything empty/zero when tags are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub format: String,
    pub file_type: String,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub album_artist: String,
    pub composer: String,
    pub genre: String,
    pub year: u32,
    pub track_number: u32,
    pub track_total: u32,
    pub disk_number: u32,
    pub disk_total: u32,
}

/// One inventoried media file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute file path
    pub path: PathBuf,
    /// Extension including the leading dot, original case
    pub extension: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Uppercase hex MD5 of the whole file (empty = failed)
    pub full_hash: String,
    /// Hex digest of the audio payload only (empty = unsupported or failed)
    pub audio_checksum: String,
    /// Descriptive metadata
    pub tags: TrackTags,
}

impl FileRecord {
    /// A freshly scanned record carrying identity fields only.
    pub fn scanned(path: PathBuf, extension: String, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            extension,
            size,
            modified,
            full_hash: String::new(),
            audio_checksum: String::new(),
            tags: TrackTags::default(),
        }
    }

    /// Whether the tag reader recognized the file.
    pub fn has_recognized_tags(&self) -> bool {
        !self.tags.format.is_empty() && !self.tags.file_type.is_empty()
    }

    /// Modification time in the local zone, millisecond precision.
    pub fn mod_time_string(&self) -> String {
        DateTime::<Local>::from(self.modified)
            .format(MOD_TIME_FORMAT)
            .to_string()
    }

    /// The output row, in [`COLUMNS`] order.
    pub fn to_row(&self) -> [String; COLUMNS.len()] {
        let t = &self.tags;
        [
            self.path.to_string_lossy().into_owned(),
            self.extension.clone(),
            self.size.to_string(),
            self.mod_time_string(),
            self.full_hash.clone(),
            self.audio_checksum.clone(),
            t.format.clone(),
            t.file_type.clone(),
            t.title.clone(),
            t.album.clone(),
            t.album_artist.clone(),
            t.artist.clone(),
            t.composer.clone(),
            t.genre.clone(),
            t.year.to_string(),
            t.track_number.to_string(),
            t.track_total.to_string(),
            t.disk_number.to_string(),
            t.disk_total.to_string(),
        ]
    }
}
