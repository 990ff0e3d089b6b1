use crate::storage::backend::{ObjectStore, ObjectStream};
use crate::types::{ListPage, ObjectMetadata, StoreError};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use futures::stream;

pub struct S3Backend {
    client: S3Client,
    bucket: String,
    name: String,
}

impl S3Backend {
    /// Build metadata from the optional fields of an SDK response
    fn extract_metadata(
        key: &str,
        content_length: Option<i64>,
        etag: Option<&str>,
        last_modified: Option<&aws_sdk_s3::primitives::DateTime>,
        content_type: Option<&str>,
    ) -> ObjectMetadata {
        let size = content_length.unwrap_or(0).max(0) as u64;
        let etag = etag.map(|s| s.to_string()).unwrap_or_default();
        let last_modified = last_modified
            .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), 0))
            .unwrap_or_else(chrono::Utc::now);
        let content_type = content_type
            .map(|s| s.to_string())
            .unwrap_or_else(|| "binary/octet-stream".to_string());

        ObjectMetadata {
            key: key.to_string(),
            size,
            etag,
            last_modified,
            content_type,
        }
    }

    /// Translate an SDK failure into the store error taxonomy
    fn service_error<E>(err: &E) -> StoreError
    where
        E: ProvideErrorMetadata + std::fmt::Display,
    {
        StoreError::service(
            err.code().unwrap_or("InternalError"),
            err.message()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.to_string()),
        )
    }

    pub async fn new(
        name: String,
        bucket: String,
        region: String,
        endpoint: Option<String>,
        force_path_style: bool,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));

        // Static credentials override the default provider chain
        if let (Some(key_id), Some(secret_key)) = (access_key_id, secret_access_key) {
            config_loader = config_loader.credentials_provider(
                aws_sdk_s3::config::Credentials::new(key_id, secret_key, None, None, "static"),
            );
        }

        let config = config_loader.load().await;

        let mut s3_config_builder =
            aws_sdk_s3::config::Builder::from(&config).force_path_style(force_path_style);

        if let Some(endpoint_url) = endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        Ok(Self {
            client,
            bucket,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn body_stream(name: String, body: ByteStream) -> ObjectStream {
        let chunks = stream::unfold(body, move |mut body| {
            let name = name.clone();
            async move {
                let chunk = body.next().await?.map_err(|e| {
                    tracing::error!("[{}] Failed to read object chunk: {}", name, e);
                    StoreError::service("ReadError", format!("Failed to read object: {}", e))
                });
                Some((chunk, body))
            }
        });
        Box::pin(chunks)
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Backend {
    async fn get_object(&self, key: &str) -> Result<(ObjectStream, ObjectMetadata), StoreError> {
        tracing::debug!("[{}] Getting object: {}", self.name, key);

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let metadata = Self::extract_metadata(
                    key,
                    output.content_length(),
                    output.e_tag(),
                    output.last_modified(),
                    output.content_type(),
                );

                Ok((Self::body_stream(self.name.clone(), output.body), metadata))
            }
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_key())
                    || err
                        .raw_response()
                        .is_some_and(|r| r.status().as_u16() == 404);

                if missing {
                    tracing::debug!("[{}] Object not found: {}", self.name, key);
                    return Err(StoreError::not_found(key));
                }

                tracing::error!("[{}] Failed to get object {}: {}", self.name, key, err);
                Err(Self::service_error(&err))
            }
        }
    }

    async fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<&str>,
        max_keys: i32,
    ) -> Result<ListPage, StoreError> {
        tracing::debug!(
            "[{}] Listing objects with prefix: {:?}, delimiter: {:?}",
            self.name,
            prefix,
            delimiter
        );

        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(max_keys);

        if let Some(d) = delimiter {
            request = request.delimiter(d);
        }
        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        match request.send().await {
            Ok(output) => {
                let objects: Vec<ObjectMetadata> = output
                    .contents()
                    .iter()
                    .filter_map(|obj| {
                        Some(Self::extract_metadata(
                            obj.key()?,
                            obj.size(),
                            obj.e_tag(),
                            obj.last_modified(),
                            None,
                        ))
                    })
                    .collect();

                let common_prefixes: Vec<String> = output
                    .common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(|s| s.to_string()))
                    .collect();

                let next_continuation_token = if output.is_truncated().unwrap_or(false) {
                    output.next_continuation_token().map(|s| s.to_string())
                } else {
                    None
                };

                tracing::debug!(
                    "[{}] Found {} objects and {} prefixes (truncated: {})",
                    self.name,
                    objects.len(),
                    common_prefixes.len(),
                    next_continuation_token.is_some()
                );

                Ok(ListPage {
                    objects,
                    common_prefixes,
                    next_continuation_token,
                })
            }
            Err(err) => {
                tracing::error!("[{}] Failed to list objects: {}", self.name, err);
                Err(Self::service_error(&err))
            }
        }
    }
}
