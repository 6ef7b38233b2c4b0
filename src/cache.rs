//! Local storage for downloaded objects
//!
//! Objects land either at `<cache_root>/<key>`, mirroring the object key as a
//! relative path, or in an anonymous temp file when no cache root is set.

use std::fs::{self, File, OpenOptions};
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::error::{DownloadError, Result};

/// Writable local file a download is streamed into
#[derive(Debug)]
pub struct LocalStore {
    pub file: File,
    /// `None` for ephemeral storage
    pub path: Option<PathBuf>,
}

/// Deterministic cache location for `key` under `root`.
///
/// Empty and `.` segments are skipped. Keys that would resolve outside `root`
/// (absolute keys, `..` segments) or that name no file are rejected.
pub fn cache_path(root: &Path, key: &str) -> Result<PathBuf> {
    let invalid = || {
        DownloadError::InvalidPath(format!(
            "key '{}' cannot be mapped into the cache directory",
            key
        ))
    };

    let mut path = root.to_path_buf();
    let mut pushed = false;
    for segment in key.split('/') {
        for component in Path::new(segment).components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    pushed = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid())
                }
            }
        }
    }

    if !pushed {
        return Err(invalid());
    }
    Ok(path)
}

/// Open the local store for `key`, truncating any previous cache entry.
pub fn resolve_local_store(root: Option<&Path>, key: &str) -> Result<LocalStore> {
    let Some(root) = root else {
        debug!("local_store: {} -> ephemeral", key);
        return Ok(LocalStore {
            file: tempfile::tempfile()?,
            path: None,
        });
    };

    let path = cache_path(root, key)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)?;
    debug!("local_store: {} -> {}", key, path.display());

    Ok(LocalStore {
        file,
        path: Some(path),
    })
}
