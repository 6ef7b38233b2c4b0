//! Read-only handle over a locally cached S3 object

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::cache::{cache_path, resolve_local_store};
use crate::config::DownloaderConfig;
use crate::error::{DownloadError, Result};
use crate::providers::ObjectStore;

/// Where a handle is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Resolving,
    Downloading,
    Ready,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Uninitialized => write!(f, "uninitialized"),
            Phase::Resolving => write!(f, "resolving"),
            Phase::Downloading => write!(f, "downloading"),
            Phase::Ready => write!(f, "ready"),
            Phase::Closed => write!(f, "closed"),
        }
    }
}

enum State {
    Uninitialized,
    Resolving,
    Downloading,
    Ready {
        reader: BufReader<File>,
        local_path: Option<PathBuf>,
    },
    Closed,
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            State::Uninitialized => Phase::Uninitialized,
            State::Resolving => Phase::Resolving,
            State::Downloading => Phase::Downloading,
            State::Ready { .. } => Phase::Ready,
            State::Closed => Phase::Closed,
        }
    }
}

/// A file-like, read-only view of one S3 object.
///
/// The object is downloaded into local storage once (on open, or on first read
/// for lazy downloaders) and every read is served from that local copy.
/// Dropping the handle closes it; ephemeral storage is deleted at that point.
pub struct CachedObject {
    store: Arc<dyn ObjectStore>,
    config: Arc<DownloaderConfig>,
    path: String,
    bucket: String,
    key: String,
    buffer_size: usize,
    force_refresh: bool,
    /// Set once a transfer completes; survives `close()`
    downloaded: bool,
    state: State,
}

impl CachedObject {
    pub(crate) fn new(
        store: Arc<dyn ObjectStore>,
        config: Arc<DownloaderConfig>,
        path: String,
        bucket: String,
        key: String,
        buffer_size: usize,
        force_refresh: bool,
    ) -> Self {
        CachedObject {
            store,
            config,
            path,
            bucket,
            key,
            buffer_size,
            force_refresh,
            downloaded: false,
            state: State::Uninitialized,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Whether this handle transferred the object from S3.
    /// False for cache hits; stays true after `close()`.
    pub fn is_downloaded(&self) -> bool {
        self.downloaded
    }

    /// Cache file backing this handle, if it is persistent and resolved
    pub fn local_path(&self) -> Option<&Path> {
        match &self.state {
            State::Ready { local_path, .. } => local_path.as_deref(),
            _ => None,
        }
    }

    /// Read `length` bytes, or everything up to end of file when `None`.
    ///
    /// Fewer bytes than requested are returned only at end of file.
    pub fn read_bytes(&mut self, length: Option<usize>) -> Result<Vec<u8>> {
        let reader = self.ensure_ready()?;
        let mut data = Vec::new();
        match length {
            None => reader.read_to_end(&mut data)?,
            Some(length) => reader.take(length as u64).read_to_end(&mut data)?,
        };
        Ok(data)
    }

    /// Next line including its `\n`, or the remainder when the file has no trailing newline.
    /// Empty at end of file.
    pub fn readline(&mut self) -> Result<Vec<u8>> {
        let reader = self.ensure_ready()?;
        let mut line = Vec::new();
        reader.read_until(b'\n', &mut line)?;
        Ok(line)
    }

    pub fn readlines(&mut self) -> Result<Vec<Vec<u8>>> {
        let reader = self.ensure_ready()?;
        let mut lines = Vec::new();
        loop {
            let mut line = Vec::new();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            lines.push(line);
        }
        Ok(lines)
    }

    /// Always fails; cached objects cannot be written.
    pub fn write(&mut self, _data: &[u8]) -> Result<usize> {
        Err(DownloadError::ReadOnly)
    }

    /// Always fails; cached objects cannot be written.
    pub fn flush(&mut self) -> Result<()> {
        Err(DownloadError::ReadOnly)
    }

    /// Release the local file. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.is_closed() {
            debug!("close: s3://{}/{}", self.bucket, self.key);
        }
        self.state = State::Closed;
    }

    /// Drive the state machine until the handle is `Ready` or `Closed`.
    pub(crate) fn ensure_ready(&mut self) -> Result<&mut BufReader<File>> {
        while !matches!(self.state, State::Ready { .. }) {
            if let Err(err) = self.advance() {
                // A failed transfer can be retried by the next call; closing is final.
                if !self.is_closed() {
                    self.state = State::Uninitialized;
                }
                return Err(err);
            }
        }

        match &mut self.state {
            State::Ready { reader, .. } => Ok(reader),
            _ => unreachable!("transition loop only exits in the ready state"),
        }
    }

    fn advance(&mut self) -> Result<()> {
        let next = match self.state {
            State::Uninitialized => State::Resolving,
            State::Resolving => self.resolve()?,
            State::Downloading => {
                let next = self.download()?;
                self.downloaded = true;
                next
            }
            State::Ready { .. } => return Ok(()),
            State::Closed => return Err(DownloadError::Closed),
        };
        self.state = next;
        Ok(())
    }

    fn resolve(&self) -> Result<State> {
        if !self.config.reuse_cache || self.force_refresh {
            return Ok(State::Downloading);
        }
        let Some(root) = self.config.cache_root() else {
            return Ok(State::Downloading);
        };

        let path = cache_path(root, &self.key)?;
        if !path.is_file() {
            return Ok(State::Downloading);
        }

        // Not compared against the remote object; a partial or stale file is served as-is.
        info!("cache hit: s3://{}/{} -> {}", self.bucket, self.key, path.display());
        let file = File::open(&path)?;
        Ok(State::Ready {
            reader: BufReader::new(file),
            local_path: Some(path),
        })
    }

    fn download(&self) -> Result<State> {
        let mut local = resolve_local_store(self.config.cache_root(), &self.key)?;
        info!(
            "download: s3://{}/{} (buffer {} bytes)",
            self.bucket, self.key, self.buffer_size
        );

        let mut stream = self
            .store
            .get_object_stream(&self.bucket, &self.key)
            .map_err(|e| self.fetch_error(e))?;

        let mut total_bytes: u64 = 0;
        loop {
            let chunk = stream
                .read(self.buffer_size)
                .map_err(|e| self.fetch_error(e))?;
            if chunk.is_empty() {
                break;
            }
            local.file.write_all(&chunk)?;
            total_bytes += chunk.len() as u64;
        }

        local.file.flush()?;
        local.file.seek(SeekFrom::Start(0))?;
        info!(
            "download complete: s3://{}/{} ({} bytes)",
            self.bucket, self.key, total_bytes
        );

        Ok(State::Ready {
            reader: BufReader::new(local.file),
            local_path: local.path,
        })
    }

    fn fetch_error(&self, err: Box<dyn std::error::Error + Send + Sync>) -> DownloadError {
        warn!("fetch failed: s3://{}/{}: {}", self.bucket, self.key, err);
        DownloadError::Fetch {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
        }
    }
}

impl fmt::Debug for CachedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedObject")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("phase", &self.phase())
            .finish()
    }
}

impl Read for CachedObject {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_ready()?.read(buf)
    }
}

impl BufRead for CachedObject {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.ensure_ready()?.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if let State::Ready { reader, .. } = &mut self.state {
            reader.consume(amt);
        }
    }
}

impl Seek for CachedObject {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.ensure_ready()?.seek(pos)
    }
}
