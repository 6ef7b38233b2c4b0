//! Downloader configuration

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default chunk size for streamed downloads (256 MB)
pub const DEFAULT_BUFFER_SIZE: usize = 256 * 1024 * 1024;

/// Session-wide settings shared by every handle a `Downloader` opens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Directory that downloaded objects are stored under, at `<cache_dir>/<key>`.
    /// `None` stores each download in an anonymous temp file instead.
    pub cache_dir: Option<PathBuf>,
    /// Download on first read instead of on open.
    pub lazy: bool,
    /// Serve an existing `<cache_dir>/<key>` file without contacting S3.
    /// The file is never compared against the remote object, so it may be stale.
    pub reuse_cache: bool,
    /// Maximum bytes requested from the remote stream per chunk.
    pub buffer_size: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        DownloaderConfig {
            cache_dir: None,
            lazy: false,
            reuse_cache: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl DownloaderConfig {
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn reuse_cache(mut self, reuse_cache: bool) -> Self {
        self.reuse_cache = reuse_cache;
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Cache root, treating an empty path the same as no cache directory
    pub fn cache_root(&self) -> Option<&Path> {
        self.cache_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_eager_ephemeral_and_fresh() {
        let config = DownloaderConfig::default();
        assert!(config.cache_root().is_none());
        assert!(!config.lazy);
        assert!(!config.reuse_cache);
        assert_eq!(config.buffer_size, 256 * 1024 * 1024);
    }

    #[test]
    fn empty_cache_dir_means_ephemeral() {
        let config = DownloaderConfig::default().with_cache_dir("");
        assert!(config.cache_root().is_none());

        let config = DownloaderConfig::default().with_cache_dir("tmp");
        assert_eq!(config.cache_root(), Some(Path::new("tmp")));
    }

    #[test]
    fn config_deserializes_with_defaults_for_missing_fields() {
        let config: DownloaderConfig =
            serde_json::from_str(r#"{ "cache_dir": "/var/cache/s3", "reuse_cache": true }"#)
                .unwrap();
        assert_eq!(config.cache_root(), Some(Path::new("/var/cache/s3")));
        assert!(config.reuse_cache);
        assert!(!config.lazy);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }
}
