//! S3 path parsing

use crate::error::{DownloadError, Result};

const SCHEMES: [&str; 2] = ["s3://", "s3a://"];

/// Split `bucket/key` (optionally prefixed with `s3://` or `s3a://`) into its parts.
pub fn split_path(path: &str) -> Result<(String, String)> {
    let trimmed = SCHEMES
        .iter()
        .find_map(|scheme| path.strip_prefix(scheme))
        .unwrap_or(path)
        .trim_start_matches('/');

    let (bucket, key) = trimmed
        .split_once('/')
        .ok_or_else(|| DownloadError::InvalidPath(format!("'{}' has no object key", path)))?;

    if bucket.is_empty() {
        return Err(DownloadError::InvalidPath(format!("'{}' has no bucket", path)));
    }
    if key.is_empty() {
        return Err(DownloadError::InvalidPath(format!("'{}' has no object key", path)));
    }

    Ok((bucket.to_string(), key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::split_path;

    #[test]
    fn splits_bucket_and_nested_key() {
        assert_eq!(
            split_path("my-bucket/data/2024/file.csv").unwrap(),
            ("my-bucket".to_string(), "data/2024/file.csv".to_string())
        );
    }

    #[test]
    fn strips_scheme_prefixes() {
        let expected = ("bucket".to_string(), "key.txt".to_string());
        assert_eq!(split_path("s3://bucket/key.txt").unwrap(), expected);
        assert_eq!(split_path("s3a://bucket/key.txt").unwrap(), expected);
        assert_eq!(split_path("/bucket/key.txt").unwrap(), expected);
    }

    #[test]
    fn rejects_paths_without_key_or_bucket() {
        assert!(split_path("bucket").is_err());
        assert!(split_path("bucket/").is_err());
        assert!(split_path("s3:///key").is_err());
        assert!(split_path("").is_err());
    }
}
