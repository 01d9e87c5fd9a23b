//! Audio-only checksum: a SHA-256 over the part of a file that is not tag
//! metadata.
//!
//! The container is detected from the leading bytes:
//!
//! | Leading bytes     | Digested range                                   |
//! |-------------------|--------------------------------------------------|
//! | `fLaC`            | everything after the last metadata block         |
//! | `....ftyp`        | payloads of all top-level `mdat` atoms           |
//! | `OggS`            | all packet data except the comment packet        |
//! | `RIFF....WAVE`    | payloads of all `data` chunks                    |
//! | `ID3`             | after the ID3v2 tag, up to a trailing ID3v1 tag  |
//! | anything else     | whole file up to a trailing ID3v1 tag            |

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};

const ID3V1_LEN: u64 = 128;
const ID3V2_HEADER_LEN: u64 = 10;
const OGG_PAGE_HEADER_LEN: u64 = 27;

/// Index of the comment header packet in Vorbis, Opus and Speex streams.
const OGG_COMMENT_PACKET: usize = 1;

/// Errors while locating the audio payload.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} structure runs past end of file")]
    Truncated(&'static str),

    #[error("malformed {0}")]
    Malformed(&'static str),
}

/// Recognized container layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Flac,
    Mp4,
    Ogg,
    Wave,
    Id3v2,
    Raw,
}

impl Container {
    fn detect(head: &[u8]) -> Self {
        if head.starts_with(b"fLaC") {
            Self::Flac
        } else if head.len() >= 8 && &head[4..8] == b"ftyp" {
            Self::Mp4
        } else if head.starts_with(b"OggS") {
            Self::Ogg
        } else if head.starts_with(b"RIFF") && head.len() >= 12 && &head[8..12] == b"WAVE" {
            Self::Wave
        } else if head.starts_with(b"ID3") {
            Self::Id3v2
        } else {
            Self::Raw
        }
    }
}

/// Checksum the audio payload of the file at `path` using a fresh handle.
pub fn audio_checksum(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    checksum(BufReader::new(file)).map_err(|e| Error::checksum(path, e))
}

/// Checksum the audio payload readable from `reader`, lowercase hex.
pub fn checksum<R: Read + Seek>(mut reader: R) -> std::result::Result<String, ChecksumError> {
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut head = [0u8; 12];
    let n = read_up_to(&mut reader, &mut head)?;

    let mut hasher = Sha256::new();
    match Container::detect(&head[..n]) {
        Container::Flac => {
            let start = flac_audio_start(&mut reader, len)?;
            hash_range(&mut reader, start, len, &mut hasher)?;
        }
        Container::Mp4 => {
            hash_mdat_atoms(&mut reader, len, &mut hasher)?;
        }
        Container::Ogg => {
            hash_ogg_packets(&mut reader, len, &mut hasher)?;
        }
        Container::Wave => {
            hash_wave_data(&mut reader, len, &mut hasher)?;
        }
        Container::Id3v2 => {
            let start = id3v2_end(&mut reader, len)?;
            let end = id3v1_start(&mut reader, len)?.max(start);
            hash_range(&mut reader, start, end, &mut hasher)?;
        }
        Container::Raw => {
            let end = id3v1_start(&mut reader, len)?;
            hash_range(&mut reader, 0, end, &mut hasher)?;
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Read as many bytes as available into `buf`, stopping at EOF.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn hash_range<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    hasher: &mut Sha256,
) -> io::Result<()> {
    if end <= start {
        return Ok(());
    }
    reader.seek(SeekFrom::Start(start))?;
    let copied = io::copy(&mut reader.by_ref().take(end - start), hasher)?;
    if copied != end - start {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }
    Ok(())
}

/// Offset of the first byte after a leading ID3v2 tag (and its footer).
fn id3v2_end<R: Read + Seek>(reader: &mut R, len: u64) -> std::result::Result<u64, ChecksumError> {
    let mut header = [0u8; ID3V2_HEADER_LEN as usize];
    reader.seek(SeekFrom::Start(0))?;
    if read_up_to(reader, &mut header)? < header.len() {
        return Err(ChecksumError::Truncated("ID3v2 header"));
    }

    let flags = header[5];
    let size_bytes = &header[6..10];
    if size_bytes.iter().any(|b| b & 0x80 != 0) {
        return Err(ChecksumError::Malformed("ID3v2 size"));
    }
    let size = size_bytes
        .iter()
        .fold(0u64, |acc, b| (acc << 7) | u64::from(*b));

    let footer = if flags & 0x10 != 0 { ID3V2_HEADER_LEN } else { 0 };
    let end = ID3V2_HEADER_LEN + size + footer;
    if end > len {
        return Err(ChecksumError::Truncated("ID3v2 tag"));
    }
    Ok(end)
}

/// Offset where a trailing ID3v1 tag starts, or `len` when there is none.
fn id3v1_start<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<u64> {
    if len < ID3V1_LEN {
        return Ok(len);
    }
    let mut marker = [0u8; 3];
    reader.seek(SeekFrom::Start(len - ID3V1_LEN))?;
    reader.read_exact(&mut marker)?;
    Ok(if &marker == b"TAG" { len - ID3V1_LEN } else { len })
}

/// Offset of the first audio frame after the FLAC metadata blocks.
fn flac_audio_start<R: Read + Seek>(
    reader: &mut R,
    len: u64,
) -> std::result::Result<u64, ChecksumError> {
    let mut pos = 4u64;
    loop {
        let mut header = [0u8; 4];
        reader.seek(SeekFrom::Start(pos))?;
        if read_up_to(reader, &mut header)? < header.len() {
            return Err(ChecksumError::Truncated("FLAC metadata block"));
        }
        let last = header[0] & 0x80 != 0;
        let block_len = u64::from(u32::from_be_bytes([0, header[1], header[2], header[3]]));
        pos += 4 + block_len;
        if pos > len {
            return Err(ChecksumError::Truncated("FLAC metadata block"));
        }
        if last {
            return Ok(pos);
        }
    }
}

/// Feed the payload of every top-level `mdat` atom to `hasher`.
fn hash_mdat_atoms<R: Read + Seek>(
    reader: &mut R,
    len: u64,
    hasher: &mut Sha256,
) -> std::result::Result<(), ChecksumError> {
    let mut pos = 0u64;
    let mut found = false;

    while pos + 8 <= len {
        let mut header = [0u8; 8];
        reader.seek(SeekFrom::Start(pos))?;
        reader.read_exact(&mut header)?;
        let kind = [header[4], header[5], header[6], header[7]];

        let (size, header_len) = match u32::from_be_bytes([header[0], header[1], header[2], header[3]]) {
            0 => (len - pos, 8),
            1 => {
                let mut ext = [0u8; 8];
                if read_up_to(reader, &mut ext)? < ext.len() {
                    return Err(ChecksumError::Truncated("atom header"));
                }
                (u64::from_be_bytes(ext), 16)
            }
            n => (u64::from(n), 8),
        };
        if size < header_len {
            return Err(ChecksumError::Malformed("atom size"));
        }
        let end = pos
            .checked_add(size)
            .ok_or(ChecksumError::Malformed("atom size"))?;
        if end > len {
            return Err(ChecksumError::Truncated(if &kind == b"mdat" { "mdat" } else { "atom" }));
        }

        if &kind == b"mdat" {
            hash_range(reader, pos + header_len, end, hasher)?;
            found = true;
        }
        pos = end;
    }

    if found {
        Ok(())
    } else {
        Err(ChecksumError::Malformed("MP4 without mdat atom"))
    }
}

/// Feed every Ogg packet except the comment header to `hasher`.
///
/// Only packet bytes are digested. Page headers carry checksums and sequence
/// numbers that change whenever the comment grows or shrinks.
fn hash_ogg_packets<R: Read + Seek>(
    reader: &mut R,
    len: u64,
    hasher: &mut Sha256,
) -> std::result::Result<(), ChecksumError> {
    let mut pos = 0u64;
    let mut packet = 0usize;

    while pos < len {
        let mut header = [0u8; OGG_PAGE_HEADER_LEN as usize];
        reader.seek(SeekFrom::Start(pos))?;
        if read_up_to(reader, &mut header)? < header.len() {
            return Err(ChecksumError::Truncated("Ogg page header"));
        }
        if &header[..4] != b"OggS" {
            return Err(ChecksumError::Malformed("Ogg page"));
        }

        let mut lacing = vec![0u8; usize::from(header[26])];
        if read_up_to(reader, &mut lacing)? < lacing.len() {
            return Err(ChecksumError::Truncated("Ogg segment table"));
        }
        let body_start = pos + OGG_PAGE_HEADER_LEN + lacing.len() as u64;
        let body_len: u64 = lacing.iter().map(|&b| u64::from(b)).sum();
        let end = body_start + body_len;
        if end > len {
            return Err(ChecksumError::Truncated("Ogg page"));
        }

        // A lacing value below 255 ends the current packet.
        let mut segment = body_start;
        for &lace in &lacing {
            let next = segment + u64::from(lace);
            if packet != OGG_COMMENT_PACKET {
                hash_range(reader, segment, next, hasher)?;
            }
            if lace < 255 {
                packet += 1;
            }
            segment = next;
        }
        pos = end;
    }
    Ok(())
}

/// Feed the payload of every `data` chunk of a RIFF/WAVE file to `hasher`.
fn hash_wave_data<R: Read + Seek>(
    reader: &mut R,
    len: u64,
    hasher: &mut Sha256,
) -> std::result::Result<(), ChecksumError> {
    // "RIFF", total size, "WAVE"
    let mut pos = 12u64;
    let mut found = false;

    while pos + 8 <= len {
        let mut header = [0u8; 8];
        reader.seek(SeekFrom::Start(pos))?;
        reader.read_exact(&mut header)?;
        let size = u64::from(u32::from_le_bytes([header[4], header[5], header[6], header[7]]));
        let start = pos + 8;
        let end = start + size;
        if end > len {
            return Err(ChecksumError::Truncated("RIFF chunk"));
        }

        if &header[..4] == b"data" {
            hash_range(reader, start, end, hasher)?;
            found = true;
        }
        // Chunks are padded to an even length.
        pos = end + (size & 1);
    }

    if found {
        Ok(())
    } else {
        Err(ChecksumError::Malformed("WAVE without data chunk"))
    }
}
