//! Remote object store capability
//!
//! Cached handles only need one thing from a store: a byte stream for a
//! `(bucket, key)` pair, read in bounded chunks. Providers:
//! - `s3`: AWS S3 and S3-compatible services via `aws-sdk-s3`
//! - `memory`: in-process objects, for tests and embedding

mod memory;
mod s3;
mod s3_client;

pub use memory::MemoryStore;
pub use s3::{S3Store, S3StoreConfig};
pub use s3_client::{create_s3_client, S3ClientConfig};

pub type StoreResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A remote store that can open objects for streaming reads.
pub trait ObjectStore: Send + Sync {
    fn get_object_stream<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> StoreResult<Box<dyn ObjectStream + 'a>>;
}

/// Body of a remote object, consumed front to back.
pub trait ObjectStream {
    /// Return up to `max_bytes` of the object. An empty chunk means end of stream.
    fn read(&mut self, max_bytes: usize) -> StoreResult<Vec<u8>>;
}
