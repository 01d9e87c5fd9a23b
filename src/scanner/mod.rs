//! Directory scanner: one walk per root.
//!
//! Hidden entries (name starting with `.`) are pruned, including the whole
//! subtree of a hidden directory. Symbolic links to files are emitted under
//! the link's own path; linked directories are not descended into. Matching
//! files are turned into identity-only [`FileRecord`]s and pushed onto the
//! shared bounded scan queue; the push blocks while the queue is full.

use crossbeam_channel::Sender;
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::InventoryConfig;
use crate::error::{Error, Result, ResultExt};
use crate::model::FileRecord;

/// Walk `root` and push a record for every allowed, non-hidden file.
///
/// Returns the number of records emitted. The first walk error aborts this
/// root only and is returned to the caller; records already pushed stay in
/// the queue.
pub fn scan_root(root: &Path, config: &InventoryConfig, tx: &Sender<FileRecord>) -> Result<usize> {
    let mut emitted = 0;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(|source| Error::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let Some(extension) = dotted_extension(entry.path()) else {
            continue;
        };
        if !config.is_allowed(&extension) {
            continue;
        }

        let Some(meta) = file_metadata(&entry).map_err(|source| Error::Walk {
            root: root.to_path_buf(),
            source,
        })?
        else {
            continue;
        };
        let path = std::path::absolute(entry.path())
            .map(|p| clean(&p))
            .with_context(format!("resolving {}", entry.path().display()))?;
        let modified = meta.modified()?;

        debug!(path = %path.display(), "Found");
        let record = FileRecord::scanned(path, extension, meta.len(), modified);
        if tx.send(record).is_err() {
            warn!(root = %root.display(), "Scan queue closed, stopping walk");
            break;
        }
        emitted += 1;
    }

    Ok(emitted)
}

/// Metadata of a regular file, or of the file a symlink points to.
///
/// `None` for directories, dangling links and other special files.
fn file_metadata(entry: &DirEntry) -> walkdir::Result<Option<Metadata>> {
    if entry.file_type().is_file() {
        return entry.metadata().map(Some);
    }
    if entry.path_is_symlink() {
        return Ok(std::fs::metadata(entry.path()).ok().filter(|m| m.is_file()));
    }
    Ok(None)
}

/// Whether a directory entry's own name starts with a dot.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().starts_with(b".")
}

/// Drop `.` segments and resolve `..` against the preceding segment.
///
/// Purely lexical: `path` must already be absolute, and `..` at the root
/// stays at the root.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// The extension including its leading dot, original case.
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
}

/// Collect the paths a walk of `root` would emit.
#[cfg(test)]
pub fn scan_to_vec(root: &Path, config: &InventoryConfig) -> Result<Vec<PathBuf>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    scan_root(root, config, &tx)?;
    drop(tx);
    Ok(rx.into_iter().map(|r| r.path).collect())
}
