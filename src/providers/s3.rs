//! S3-backed object store
//!
//! The SDK is async; cached handles are blocking. `S3Store` owns a small
//! runtime and blocks on each request, so it must not be used from inside an
//! async task.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

use super::s3_client::{create_s3_client, S3ClientConfig};
use super::{ObjectStore, ObjectStream, StoreResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct S3StoreConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...)
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

pub struct S3Store {
    client: Client,
    runtime: Runtime,
}

impl S3Store {
    pub fn new(config: &S3StoreConfig) -> StoreResult<Self> {
        let runtime = build_runtime()?;
        let client = runtime.block_on(create_s3_client(&S3ClientConfig {
            access_key_id: config.access_key_id.as_deref(),
            secret_access_key: config.secret_access_key.as_deref(),
            region: config.region.as_deref(),
            endpoint_url: config.endpoint_url.as_deref(),
            force_path_style: config.force_path_style,
        }))?;
        Ok(S3Store { client, runtime })
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client) -> StoreResult<Self> {
        Ok(S3Store {
            client,
            runtime: build_runtime()?,
        })
    }
}

fn build_runtime() -> std::io::Result<Runtime> {
    RuntimeBuilder::new_multi_thread()
        .worker_threads(1)
        .thread_name("s3-download")
        .enable_all()
        .build()
}

impl ObjectStore for S3Store {
    fn get_object_stream<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> StoreResult<Box<dyn ObjectStream + 'a>> {
        debug!("get_object: s3://{}/{}", bucket, key);
        let output = self
            .runtime
            .block_on(self.client.get_object().bucket(bucket).key(key).send())?;

        Ok(Box::new(S3ObjectStream {
            body: output.body,
            runtime: &self.runtime,
            pending: Vec::new(),
        }))
    }
}

/// Re-chunks the SDK body so each read returns at most `max_bytes`.
struct S3ObjectStream<'a> {
    body: ByteStream,
    runtime: &'a Runtime,
    pending: Vec<u8>,
}

impl ObjectStream for S3ObjectStream<'_> {
    fn read(&mut self, max_bytes: usize) -> StoreResult<Vec<u8>> {
        while self.pending.len() < max_bytes {
            match self.runtime.block_on(self.body.try_next())? {
                Some(bytes) => self.pending.extend_from_slice(&bytes),
                None => break,
            }
        }

        let take = max_bytes.min(self.pending.len());
        let rest = self.pending.split_off(take);
        Ok(std::mem::replace(&mut self.pending, rest))
    }
}
