//! Object storage for exported documents
//!
//! Thin wrapper over the S3 client. Exports are uploaded under
//! `exports/{paper_id}/` and the returned URL is persisted on the
//! paper row.

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

/// S3-backed storage client
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    endpoint: Option<String>,
    public_base_url: Option<String>,
}

impl Storage {
    /// Create a storage client from configuration.
    ///
    /// Credentials come from the standard AWS environment/profile chain.
    /// A custom endpoint (MinIO etc.) switches to path-style addressing.
    pub async fn new(config: &StorageConfig) -> Self {
        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.clone(),
            public_base_url: config.public_base_url.clone(),
        }
    }

    /// Upload a file and return its public URL
    pub async fn put_bytes(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::StorageError {
                message: format!("Upload of {} failed: {}", key, e),
            })?;

        Ok(self.url_for(key))
    }

    /// Delete an object. Missing keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::StorageError {
                message: format!("Delete of {} failed: {}", key, e),
            })?;

        Ok(())
    }

    /// Public URL for a stored key
    pub fn url_for(&self, key: &str) -> String {
        if let Some(ref base) = self.public_base_url {
            format!("{}/{}", base.trim_end_matches('/'), key)
        } else if let Some(ref endpoint) = self.endpoint {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
        } else {
            format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
        }
    }
}

/// Object key for an exported paper file
pub fn export_key(paper_id: uuid::Uuid, format: &str, extension: &str) -> String {
    format!("exports/{}/{}.{}", paper_id, format, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_with(public: Option<&str>, endpoint: Option<&str>) -> Storage {
        let config = StorageConfig {
            bucket: "test-bucket".to_string(),
            endpoint: endpoint.map(String::from),
            region: "us-east-1".to_string(),
            public_base_url: public.map(String::from),
        };
        // Build only the URL parts; no network involved.
        Storage {
            client: Client::from_conf(
                aws_sdk_s3::config::Builder::new()
                    .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                    .region(aws_sdk_s3::config::Region::new("us-east-1"))
                    .build(),
            ),
            bucket: config.bucket,
            endpoint: config.endpoint,
            public_base_url: config.public_base_url,
        }
    }

    #[test]
    fn test_url_prefers_public_base() {
        let storage = storage_with(Some("https://files.example.com/"), None);
        assert_eq!(
            storage.url_for("exports/a/paper.pdf"),
            "https://files.example.com/exports/a/paper.pdf"
        );
    }

    #[test]
    fn test_url_falls_back_to_endpoint() {
        let storage = storage_with(None, Some("http://localhost:9000"));
        assert_eq!(
            storage.url_for("k"),
            "http://localhost:9000/test-bucket/k"
        );
    }

    #[test]
    fn test_url_default_s3() {
        let storage = storage_with(None, None);
        assert_eq!(
            storage.url_for("k"),
            "https://test-bucket.s3.amazonaws.com/k"
        );
    }

    #[test]
    fn test_export_key_layout() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            export_key(id, "docx", "docx"),
            format!("exports/{}/docx.docx", id)
        );
    }
}
