//! Test utilities and fixtures for music-inventory tests.
//!
//! Builds small synthetic media files (MP3, MP4, FLAC, Ogg, WAVE) in memory
//! so tag parsing and checksum behavior can be exercised without binary
//! fixtures in the repository.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::write_mp3;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = write_mp3(dir.path(), "a.mp3", &[("TIT2", "Song A")], 0x55);
//! ```

use std::path::{Path, PathBuf};

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, no CRC, no padding, stereo.
const MPEG_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];

/// Frame length for [`MPEG_HEADER`]: 144 * 128000 / 44100.
const MPEG_FRAME_LEN: usize = 417;

/// Encode a 28-bit value as an ID3v2 syncsafe integer.
pub fn syncsafe(n: u32) -> [u8; 4] {
    [
        ((n >> 21) & 0x7F) as u8,
        ((n >> 14) & 0x7F) as u8,
        ((n >> 7) & 0x7F) as u8,
        (n & 0x7F) as u8,
    ]
}

/// An ID3v2.3 tag containing Latin-1 text frames, e.g. `("TIT2", "Title")`.
pub fn id3v23_tag(frames: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (id, text) in frames {
        assert_eq!(id.len(), 4, "frame ids are four bytes");
        let size = (text.len() + 1) as u32;
        body.extend_from_slice(id.as_bytes());
        body.extend_from_slice(&size.to_be_bytes());
        body.extend_from_slice(&[0, 0]);
        body.push(0); // ISO-8859-1
        body.extend_from_slice(text.as_bytes());
    }

    let mut tag = b"ID3".to_vec();
    tag.extend_from_slice(&[3, 0, 0]);
    tag.extend_from_slice(&syncsafe(body.len() as u32));
    tag.extend_from_slice(&body);
    tag
}

/// A run of valid MPEG audio frames whose payload bytes are all `fill`.
pub fn mpeg_frames(count: usize, fill: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(count * MPEG_FRAME_LEN);
    for _ in 0..count {
        out.extend_from_slice(&MPEG_HEADER);
        out.extend(std::iter::repeat_n(fill, MPEG_FRAME_LEN - MPEG_HEADER.len()));
    }
    out
}

/// A 128-byte ID3v1 trailer with the given title.
pub fn id3v1_tag(title: &str) -> Vec<u8> {
    let mut tag = vec![0u8; 128];
    tag[..3].copy_from_slice(b"TAG");
    let n = title.len().min(30);
    tag[3..3 + n].copy_from_slice(&title.as_bytes()[..n]);
    tag
}

/// A tagged MP3: ID3v2.3 tag followed by twelve audio frames.
pub fn mp3_bytes(frames: &[(&str, &str)], fill: u8) -> Vec<u8> {
    let mut bytes = id3v23_tag(frames);
    bytes.extend_from_slice(&mpeg_frames(12, fill));
    bytes
}

/// Write [`mp3_bytes`] to `dir/name`.
pub fn write_mp3(dir: &Path, name: &str, frames: &[(&str, &str)], fill: u8) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, mp3_bytes(frames, fill)).expect("Failed to write test mp3");
    path
}

/// A single MP4 atom.
pub fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

/// An M4A-shaped file: `ftyp`, a `moov` holding `meta`, then `mdat`.
pub fn m4a_bytes(meta: &[u8], audio: &[u8]) -> Vec<u8> {
    let mut out = atom(b"ftyp", b"M4A \0\0\0\0M4A isom");
    out.extend_from_slice(&atom(b"moov", meta));
    out.extend_from_slice(&atom(b"mdat", audio));
    out
}

/// A FLAC-shaped file: marker, one STREAMINFO block and one last
/// VORBIS_COMMENT block, then frame bytes.
pub fn flac_bytes(comment: &[u8], frames: &[u8]) -> Vec<u8> {
    let mut out = b"fLaC".to_vec();
    out.push(0x00);
    out.extend_from_slice(&[0, 0, 34]);
    out.extend_from_slice(&[0u8; 34]);
    let len = comment.len() as u32;
    out.push(0x80 | 0x04);
    out.extend_from_slice(&len.to_be_bytes()[1..]);
    out.extend_from_slice(comment);
    out.extend_from_slice(frames);
    out
}

/// One Ogg page holding complete packets. The CRC is left zero.
pub fn ogg_page(packets: &[&[u8]], first: bool) -> Vec<u8> {
    let mut lacing = Vec::new();
    let mut body = Vec::new();
    for packet in packets {
        lacing.extend(std::iter::repeat_n(255u8, packet.len() / 255));
        lacing.push((packet.len() % 255) as u8);
        body.extend_from_slice(packet);
    }
    assert!(lacing.len() <= 255, "too many segments for one page");

    let mut page = b"OggS".to_vec();
    page.push(0); // version
    page.push(if first { 0x02 } else { 0x00 });
    page.extend_from_slice(&[0u8; 8]); // granule position
    page.extend_from_slice(&1u32.to_le_bytes()); // serial
    page.extend_from_slice(&[0u8; 4]); // sequence
    page.extend_from_slice(&[0u8; 4]); // CRC
    page.push(lacing.len() as u8);
    page.extend_from_slice(&lacing);
    page.extend_from_slice(&body);
    page
}

/// A Vorbis-shaped Ogg stream: identification page, a page with the comment
/// and setup packets, then one page of audio packets.
pub fn ogg_vorbis_bytes(comment: &[u8], audio: &[&[u8]]) -> Vec<u8> {
    let mut comment_packet = b"\x03vorbis".to_vec();
    comment_packet.extend_from_slice(comment);

    let mut out = ogg_page(&[b"\x01vorbis ident"], true);
    out.extend_from_slice(&ogg_page(&[comment_packet.as_slice(), b"\x05vorbis setup"], false));
    out.extend_from_slice(&ogg_page(audio, false));
    out
}

/// A RIFF/WAVE file: `fmt `, an optional `LIST` chunk holding `info`, then
/// `data`. Odd-sized chunks get their pad byte.
pub fn wav_bytes(info: &[u8], samples: &[u8]) -> Vec<u8> {
    fn chunk(out: &mut Vec<u8>, id: &[u8; 4], payload: &[u8]) {
        out.extend_from_slice(id);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
    }

    let mut body = b"WAVE".to_vec();
    // PCM, mono, 8 kHz, 8-bit
    chunk(&mut body, b"fmt ", &[1, 0, 1, 0, 0x40, 0x1F, 0, 0, 0x40, 0x1F, 0, 0, 1, 0, 8, 0]);
    if !info.is_empty() {
        chunk(&mut body, b"LIST", info);
    }
    chunk(&mut body, b"data", samples);

    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}
