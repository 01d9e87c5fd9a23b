//! Content digests used to spot duplicates.
//!
//! - [`full_hash`]: MD5 over every byte of the file (exact duplicates)
//! - [`audio::audio_checksum`]: SHA-256 over the audio payload only, tags
//!   excluded (same music, different tags)
//!
//! Each function opens its own handle; nothing is shared between digests.

pub mod audio;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, ResultExt};

const BUF_SIZE: usize = 64 * 1024;

/// Stream a file through MD5.
///
/// # Returns
///
/// Uppercase hex digest (32 characters)
///
/// # Errors
///
/// Returns an IO error if the file cannot be opened or read.
pub fn full_hash(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(format!("opening {}", path.display()))?;
    hash_reader(file).with_context(format!("reading {}", path.display()))
}

/// MD5 of everything `reader` yields, uppercase hex.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut ctx = md5::Context::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        ctx.consume(&buf[..n]);
    }
    Ok(format!("{:X}", ctx.compute()))
}
