//! Entry point that opens cached handles for S3 paths

use std::sync::Arc;

use log::debug;

use crate::config::DownloaderConfig;
use crate::error::{DownloadError, Result};
use crate::object::CachedObject;
use crate::path::split_path;
use crate::providers::{ObjectStore, S3Store, S3StoreConfig, StoreResult};

/// Modes accepted by `OpenOptions::mode`; both mean binary read-only.
const READ_MODES: [&str; 2] = ["rb", "r"];

/// Per-open overrides
#[derive(Debug, Clone)]
pub struct OpenOptions {
    mode: String,
    buffer_size: Option<usize>,
    force_refresh: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            mode: "rb".to_string(),
            buffer_size: None,
            force_refresh: false,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// File mode. Only read modes are supported; anything else fails at open.
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Chunk size for this handle's download, overriding the downloader's.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size);
        self
    }

    /// Download even when `reuse_cache` would serve an existing cache file.
    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }
}

/// Opens S3 objects as read-only, locally cached handles.
///
/// The store is shared by every handle opened from this downloader.
#[derive(Clone)]
pub struct Downloader {
    store: Arc<dyn ObjectStore>,
    config: Arc<DownloaderConfig>,
}

impl Downloader {
    pub fn new(config: DownloaderConfig, store: impl ObjectStore + 'static) -> Self {
        Self::with_shared_store(config, Arc::new(store))
    }

    pub fn with_shared_store(config: DownloaderConfig, store: Arc<dyn ObjectStore>) -> Self {
        Downloader {
            store,
            config: Arc::new(config),
        }
    }

    /// Downloader backed by S3 (or an S3-compatible endpoint)
    pub fn s3(config: DownloaderConfig, s3_config: &S3StoreConfig) -> StoreResult<Self> {
        Ok(Self::new(config, S3Store::new(s3_config)?))
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Open `bucket/key` read-only with default options.
    pub fn open(&self, path: &str) -> Result<CachedObject> {
        self.open_with(path, &OpenOptions::default())
    }

    /// Open `bucket/key` read-only.
    ///
    /// Unless the downloader is lazy, the object is resolved (cache reuse or
    /// download) before this returns.
    pub fn open_with(&self, path: &str, options: &OpenOptions) -> Result<CachedObject> {
        if !READ_MODES.contains(&options.mode.as_str()) {
            return Err(DownloadError::UnsupportedMode(options.mode.clone()));
        }

        let buffer_size = options.buffer_size.unwrap_or(self.config.buffer_size);
        if buffer_size == 0 {
            return Err(DownloadError::InvalidBufferSize);
        }

        let (bucket, key) = split_path(path)?;
        debug!("open: s3://{}/{} lazy={}", bucket, key, self.config.lazy);

        let mut object = CachedObject::new(
            self.store.clone(),
            self.config.clone(),
            path.to_string(),
            bucket,
            key,
            buffer_size,
            options.force_refresh,
        );

        if !self.config.lazy {
            object.ensure_ready()?;
        }

        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Phase;
    use crate::providers::MemoryStore;

    fn downloader(config: DownloaderConfig) -> (Downloader, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "test_file", b"hello world!\n".to_vec());
        let downloader = Downloader::with_shared_store(config, store.clone());
        (downloader, store)
    }

    #[test]
    fn rejects_non_read_modes() {
        let (downloader, store) = downloader(DownloaderConfig::default());
        for mode in ["wb", "ab", "r+b", "w"] {
            let err = downloader
                .open_with("bucket/test_file", &OpenOptions::new().mode(mode))
                .unwrap_err();
            assert!(matches!(err, DownloadError::UnsupportedMode(m) if m == mode));
        }
        assert_eq!(store.fetches(), 0);
    }

    #[test]
    fn rejects_zero_buffer_size() {
        let (downloader, _) = downloader(DownloaderConfig::default());
        let err = downloader
            .open_with("bucket/test_file", &OpenOptions::new().buffer_size(0))
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidBufferSize));
    }

    #[test]
    fn eager_open_downloads_before_returning() {
        let (downloader, store) = downloader(DownloaderConfig::default());
        let object = downloader.open("bucket/test_file").unwrap();
        assert_eq!(object.phase(), Phase::Ready);
        assert!(object.is_downloaded());
        assert_eq!(store.fetches(), 1);
    }

    #[test]
    fn lazy_open_defers_download_to_first_read() {
        let (downloader, store) = downloader(DownloaderConfig::default().lazy(true));
        let mut object = downloader.open("s3://bucket/test_file").unwrap();
        assert_eq!(object.phase(), Phase::Uninitialized);
        assert_eq!(store.fetches(), 0);

        assert_eq!(object.read_bytes(None).unwrap(), b"hello world!\n");
        assert_eq!(store.fetches(), 1);
        assert_eq!(object.bucket(), "bucket");
        assert_eq!(object.key(), "test_file");
    }

    #[test]
    fn eager_open_of_missing_object_fails_with_fetch_error() {
        let (downloader, _) = downloader(DownloaderConfig::default());
        let err = downloader.open("bucket/missing").unwrap_err();
        assert!(matches!(err, DownloadError::Fetch { ref key, .. } if key == "missing"));
    }
}
