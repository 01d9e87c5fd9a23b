//! Embedded tag reading.
//!
//! Uses the lofty crate for format-independent tag access. A file whose
//! container is understood but which carries no tag at all is reported as
//! unrecognized (`Ok(None)`): no descriptive fields and no audio checksum.
//!
//! Free-text fields are passed through [`sanitize`] so the output table
//! only ever holds ASCII letters, digits and spaces in them.

use lofty::file::{FileType, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagType};
use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::TrackTags;

/// Read and sanitize the tags of `path` from a freshly opened handle.
///
/// `extension` is the record's dotted extension; it names MP4 variants.
pub fn read_tags(path: &Path, extension: &str) -> Result<Option<TrackTags>> {
    let file = File::open(path)?;

    let probe = Probe::new(BufReader::new(file))
        .guess_file_type()
        .map_err(|e| Error::metadata(path, format!("Failed to probe file: {e}")))?;

    // Tag parsers walk untrusted bytes; a panic there must only cost this file.
    let tagged_file = panic::catch_unwind(AssertUnwindSafe(|| probe.read()))
        .map_err(|_| Error::metadata(path, "Tag parser panicked"))?
        .map_err(|e| Error::metadata(path, format!("Failed to read tags: {e}")))?;

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return Ok(None);
    };

    let Some(file_type) = file_type_name(tagged_file.file_type(), extension) else {
        return Ok(None);
    };
    let Some(format) = tag_format_name(tag.tag_type()) else {
        return Ok(None);
    };

    Ok(Some(extract(tag, format, file_type)))
}

/// Copy descriptive fields out of a tag.
fn extract(tag: &Tag, format: &str, file_type: String) -> TrackTags {
    let item = |key: &ItemKey| tag.get_string(key).map(sanitize).unwrap_or_default();

    TrackTags {
        format: format.to_string(),
        file_type,
        title: text(tag.title()),
        album: text(tag.album()),
        artist: text(tag.artist()),
        album_artist: item(&ItemKey::AlbumArtist),
        composer: item(&ItemKey::Composer),
        genre: tag.genre().map(|g| g.into_owned()).unwrap_or_default(),
        year: tag.year().unwrap_or(0),
        track_number: tag.track().unwrap_or(0),
        track_total: tag.track_total().unwrap_or(0),
        disk_number: tag.disk().unwrap_or(0),
        disk_total: tag.disk_total().unwrap_or(0),
    }
}

fn text(value: Option<Cow<'_, str>>) -> String {
    value.map(|s| sanitize(&s)).unwrap_or_default()
}

/// Keep only ASCII letters, digits and spaces; everything else is dropped.
pub fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}

/// Stable name for the tag layout, `None` if unknown.
fn tag_format_name(tag_type: TagType) -> Option<&'static str> {
    match tag_type {
        TagType::Id3v1 => Some("ID3v1"),
        TagType::Id3v2 => Some("ID3v2"),
        TagType::Mp4Ilst => Some("MP4"),
        TagType::VorbisComments => Some("VORBIS"),
        TagType::Ape => Some("APE"),
        TagType::RiffInfo => Some("RIFF"),
        TagType::AiffText => Some("AIFF"),
        _ => None,
    }
}

/// Stable name for the container, `None` if unknown.
fn file_type_name(file_type: FileType, extension: &str) -> Option<String> {
    let name = match file_type {
        FileType::Mpeg => "MP3",
        FileType::Mp4 => {
            // The MP4 family is reported by variant (M4A, M4P, M4V, ...).
            let ext = extension.trim_start_matches('.').to_ascii_uppercase();
            return Some(if ext.starts_with("M4") { ext } else { "MP4".to_string() });
        }
        FileType::Vorbis => "OGG",
        FileType::Opus => "OPUS",
        FileType::Speex => "SPEEX",
        FileType::Flac => "FLAC",
        FileType::Wav => "WAV",
        FileType::Aiff => "AIFF",
        FileType::Aac => "AAC",
        FileType::Ape => "APE",
        FileType::Mpc => "MPC",
        FileType::WavPack => "WV",
        _ => return None,
    };
    Some(name.to_string())
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Sanitized text holds only ASCII letters, digits and spaces
        #[test]
        fn sanitize_output_alphabet(input in any::<String>()) {
            let out = sanitize(&input);
            prop_assert!(out.chars().all(|c| c.is_ascii_alphanumeric() || c == ' '));
        }

        /// Sanitizing never grows the text
        #[test]
        fn sanitize_never_longer(input in any::<String>()) {
            let out = sanitize(&input);
            prop_assert!(out.len() <= input.len());
            prop_assert!(out.chars().count() <= input.chars().count());
        }

        /// Allowed characters pass through untouched and in order
        #[test]
        fn sanitize_is_identity_on_clean_text(input in "[A-Za-z0-9 ]{0,64}") {
            prop_assert_eq!(sanitize(&input), input);
        }

        /// Sanitizing twice changes nothing more
        #[test]
        fn sanitize_idempotent(input in any::<String>()) {
            let once = sanitize(&input);
            prop_assert_eq!(sanitize(&once), once);
        }
    }
}
