//! Locally cached, read-only file handles for S3 objects
//!
//! A [`Downloader`] opens `bucket/key` paths as [`CachedObject`] handles:
//! - the object is streamed into local storage in bounded chunks
//! - with a cache directory, the copy persists at `<cache_dir>/<key>`
//! - without one, an anonymous temp file is used and removed on close
//! - `reuse_cache` serves an existing cache file without contacting S3
//!   (it is never checked for staleness)
//!
//! ```no_run
//! use s3_download::{Downloader, DownloaderConfig, S3StoreConfig};
//!
//! let config = DownloaderConfig::default().with_cache_dir("cache");
//! let downloader = Downloader::s3(config, &S3StoreConfig::default()).unwrap();
//! let mut object = downloader.open("my-bucket/data/file.csv").unwrap();
//! let header = object.readline().unwrap();
//! ```

mod cache;
mod config;
mod downloader;
mod error;
mod object;
mod path;
pub mod providers;

pub use cache::{cache_path, resolve_local_store, LocalStore};
pub use config::{DownloaderConfig, DEFAULT_BUFFER_SIZE};
pub use downloader::{Downloader, OpenOptions};
pub use error::{DownloadError, Result, FETCH_FAILED_MESSAGE};
pub use object::{CachedObject, Phase};
pub use path::split_path;
pub use providers::{MemoryStore, ObjectStore, ObjectStream, S3Store, S3StoreConfig};
