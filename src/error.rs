//! Error types for cached object handles

use std::fmt;
use std::io;

/// Message returned to callers when the remote store refuses or fails a fetch.
pub const FETCH_FAILED_MESSAGE: &str = "Couldn't download file. Verify that your S3 path is valid and that you have appropriate permissions.";

#[derive(Debug)]
pub enum DownloadError {
    /// A mode other than read-only was requested at open time.
    UnsupportedMode(String),
    /// `write` or `flush` was called on a read-only handle.
    ReadOnly,
    /// The remote store failed while fetching the object.
    Fetch { bucket: String, key: String },
    /// A read was attempted after `close()`.
    Closed,
    InvalidPath(String),
    InvalidBufferSize,
    /// Local filesystem failure, passed through as-is.
    Io(io::Error),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::UnsupportedMode(mode) => {
                write!(f, "File mode must be 'rb' or 'r', got '{}'", mode)
            }
            DownloadError::ReadOnly => write!(
                f,
                "Cached objects are read-only; upload through an S3 client instead"
            ),
            DownloadError::Fetch { .. } => write!(f, "{}", FETCH_FAILED_MESSAGE),
            DownloadError::Closed => write!(f, "Cache closed"),
            DownloadError::InvalidPath(msg) => write!(f, "Invalid S3 path: {}", msg),
            DownloadError::InvalidBufferSize => write!(f, "Buffer size must be greater than zero"),
            DownloadError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DownloadError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DownloadError {
    fn from(err: io::Error) -> Self {
        DownloadError::Io(err)
    }
}

impl From<DownloadError> for io::Error {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Io(err) => err,
            DownloadError::UnsupportedMode(_) | DownloadError::ReadOnly => {
                io::Error::new(io::ErrorKind::Unsupported, err)
            }
            DownloadError::InvalidPath(_) | DownloadError::InvalidBufferSize => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            DownloadError::Fetch { .. } | DownloadError::Closed => io::Error::other(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;
