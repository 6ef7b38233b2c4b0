//! In-memory object store

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use super::{ObjectStore, ObjectStream, StoreResult};

/// Objects held in process memory, keyed by `(bucket, key)`.
///
/// Counts fetches and chunk reads so callers can observe how often the
/// remote side was contacted.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<(String, String), Arc<[u8]>>>,
    fetches: AtomicUsize,
    chunk_reads: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.insert((bucket.to_string(), key.to_string()), data.into());
    }

    pub fn remove(&self, bucket: &str, key: &str) {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.remove(&(bucket.to_string(), key.to_string()));
    }

    /// Number of `get_object_stream` calls, including failed ones
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of chunk reads across all streams, including the final empty read
    pub fn chunk_reads(&self) -> usize {
        self.chunk_reads.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryStore {
    fn get_object_stream<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> StoreResult<Box<dyn ObjectStream + 'a>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        let data = objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("NoSuchKey: {}/{}", bucket, key),
                )
            })?;

        Ok(Box::new(MemoryObjectStream {
            data,
            position: 0,
            chunk_reads: self.chunk_reads.clone(),
        }))
    }
}

struct MemoryObjectStream {
    data: Arc<[u8]>,
    position: usize,
    chunk_reads: Arc<AtomicUsize>,
}

impl ObjectStream for MemoryObjectStream {
    fn read(&mut self, max_bytes: usize) -> StoreResult<Vec<u8>> {
        self.chunk_reads.fetch_add(1, Ordering::SeqCst);
        let end = self.data.len().min(self.position.saturating_add(max_bytes));
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;
        Ok(chunk)
    }
}
