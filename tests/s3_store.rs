use std::fs;

use s3_download::{
    DownloadError, Downloader, DownloaderConfig, ObjectStore, ObjectStream, OpenOptions, S3Store,
    S3StoreConfig, FETCH_FAILED_MESSAGE,
};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_STR: &[u8] = b"hello world!\n";

const NO_SUCH_KEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>"#;

fn mock_server(runtime: &Runtime) -> MockServer {
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-bucket/dir/test_file"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(TEST_STR))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/test-bucket/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("content-type", "application/xml")
                    .set_body_string(NO_SUCH_KEY),
            )
            .mount(&server)
            .await;
        server
    })
}

fn store_config(server: &MockServer) -> S3StoreConfig {
    S3StoreConfig {
        access_key_id: Some("test-access-key".to_string()),
        secret_access_key: Some("test-secret-key".to_string()),
        region: Some("us-east-1".to_string()),
        endpoint_url: Some(server.uri()),
        force_path_style: true,
    }
}

#[test]
fn s3_stream_is_read_in_bounded_chunks() {
    let runtime = Runtime::new().unwrap();
    let server = mock_server(&runtime);
    let store = S3Store::new(&store_config(&server)).unwrap();

    let mut stream = store.get_object_stream("test-bucket", "dir/test_file").unwrap();
    let mut chunks = Vec::new();
    loop {
        let chunk = stream.read(4).unwrap();
        if chunk.is_empty() {
            break;
        }
        assert!(chunk.len() <= 4);
        chunks.push(chunk);
    }

    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks.concat(), TEST_STR);
}

#[test]
fn downloader_caches_s3_object_on_disk() {
    let runtime = Runtime::new().unwrap();
    let server = mock_server(&runtime);
    let dir = TempDir::new().unwrap();

    let config = DownloaderConfig::default().with_cache_dir(dir.path());
    let downloader = Downloader::s3(config, &store_config(&server)).unwrap();

    let mut object = downloader
        .open_with("s3://test-bucket/dir/test_file", &OpenOptions::new().buffer_size(5))
        .unwrap();
    assert_eq!(object.read_bytes(None).unwrap(), TEST_STR);
    object.close();

    let cached = dir.path().join("dir").join("test_file");
    assert_eq!(fs::read(cached).unwrap(), TEST_STR);
}

#[test]
fn missing_s3_object_maps_to_fetch_error() {
    let runtime = Runtime::new().unwrap();
    let server = mock_server(&runtime);
    let downloader =
        Downloader::s3(DownloaderConfig::default(), &store_config(&server)).unwrap();

    let err = downloader.open("test-bucket/missing").unwrap_err();
    assert!(matches!(err, DownloadError::Fetch { .. }));
    assert_eq!(err.to_string(), FETCH_FAILED_MESSAGE);
}

#[test]
fn partial_static_credentials_are_rejected() {
    let config = S3StoreConfig {
        access_key_id: Some("only-the-id".to_string()),
        ..S3StoreConfig::default()
    };
    assert!(S3Store::new(&config).is_err());
}
