//! Object storage backend.

use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tracing::{debug, error, info, warn};

use super::TokenStore;
use crate::BoxFuture;
use crate::error::{AuthError, AuthResult};
use crate::record::{TokenDocument, TokenRecord};

/// Stores the token record as a JSON object under a fixed key.
///
/// Every `save` uploads the whole document and every `load` downloads it
/// again. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct ObjectTokenStore {
    store: Arc<dyn ObjectStore>,
    location: ObjectPath,
    bucket: String,
}

impl ObjectTokenStore {
    /// Wraps an existing object store. `bucket` is only used in log output.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        key: impl Into<ObjectPath>,
    ) -> Self {
        Self {
            store,
            location: key.into(),
            bucket: bucket.into(),
        }
    }

    /// Connects to an S3 bucket using the `AWS_*` environment variables.
    ///
    /// No request is made here; credentials are only exercised on the first
    /// `save` or `load`.
    pub fn s3(bucket: &str, key: &str) -> AuthResult<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| {
                AuthError::configuration(format!("failed to create S3 client for bucket {bucket}"))
                    .with_source(e)
            })?;
        info!(bucket, key, "using S3 token store");
        Ok(Self::new(Arc::new(store), bucket, key))
    }

    pub fn location(&self) -> &ObjectPath {
        &self.location
    }

    /// Uploads `document`, replacing the stored object.
    pub async fn write_document(&self, document: &TokenDocument) -> AuthResult<()> {
        let content = serde_json::to_vec_pretty(document).map_err(|e| {
            AuthError::internal("failed to serialize token document").with_source(e)
        })?;

        self.store
            .put(&self.location, PutPayload::from(Bytes::from(content)))
            .await
            .map_err(|e| {
                AuthError::storage_unavailable(format!(
                    "failed to upload {} to {}",
                    self.location, self.bucket
                ))
                .with_source(e)
            })?;

        debug!(bucket = %self.bucket, key = %self.location, "uploaded token document");
        Ok(())
    }

    /// Downloads the raw document. `Ok(None)` if the object does not exist.
    pub async fn read_document(&self) -> AuthResult<Option<TokenDocument>> {
        let content = match self.download().await {
            Ok(content) => content,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => {
                return Err(AuthError::storage_unavailable(format!(
                    "failed to download {} from {}",
                    self.location, self.bucket
                ))
                .with_source(e));
            }
        };

        let document = serde_json::from_slice(&content).map_err(|e| {
            AuthError::invalid_response(format!("{} is not a JSON object", self.location))
                .with_source(e)
        })?;
        Ok(Some(document))
    }

    async fn download(&self) -> object_store::Result<Bytes> {
        self.store.get(&self.location).await?.bytes().await
    }
}

impl TokenStore for ObjectTokenStore {
    fn name(&self) -> &str {
        "object"
    }

    fn save<'a>(&'a self, record: &'a TokenRecord) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let document = match record.to_document() {
                Ok(document) => document,
                Err(e) => {
                    error!(error = %e, "failed to encode token record");
                    return false;
                }
            };
            let saved = match self.write_document(&document).await {
                Ok(()) => true,
                Err(e) => {
                    error!(error = ?e, "failed to save token record");
                    false
                }
            };
            info!(bucket = %self.bucket, key = %self.location, saved, "token upload finished");
            saved
        })
    }

    fn load(&self) -> BoxFuture<'_, Option<TokenRecord>> {
        Box::pin(async move {
            let document = match self.read_document().await {
                Ok(Some(document)) => document,
                Ok(None) => {
                    warn!(bucket = %self.bucket, key = %self.location, "token object not found");
                    return None;
                }
                Err(e) => {
                    error!(error = ?e, "failed to load token record");
                    return None;
                }
            };
            match TokenRecord::from_document(document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(key = %self.location, error = %e, "ignoring incomplete token record");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::local::LocalFileSystem;
    use object_store::memory::InMemory;
    use serde_json::json;

    use crate::error::AuthErrorCode;
    use crate::store::TOKEN_FILE_NAME;

    fn in_memory() -> ObjectTokenStore {
        ObjectTokenStore::new(Arc::new(InMemory::new()), "test-bucket", TOKEN_FILE_NAME)
    }

    /// A store rooted at a regular file, so every request fails with an I/O error.
    fn broken(dir: &tempfile::TempDir) -> ObjectTokenStore {
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let store = LocalFileSystem::new_with_prefix(&blocker).unwrap();
        ObjectTokenStore::new(Arc::new(store), "broken-bucket", TOKEN_FILE_NAME)
    }

    #[test]
    fn s3_store_targets_bucket_key() {
        let store = ObjectTokenStore::s3("nowplaying-tokens", "auth/token_info.json").unwrap();
        assert_eq!(store.location().as_ref(), "auth/token_info.json");
        assert_eq!(store.name(), "object");
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = in_memory();
        let record = TokenRecord::new("A", "R", 1_700_000_000).with_extra("scope", "streaming");

        assert!(store.save(&record).await);
        assert_eq!(store.load().await, Some(record));
    }

    #[tokio::test]
    async fn load_without_save_is_absent() {
        let store = in_memory();
        assert_eq!(store.read_document().await.unwrap(), None);
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn save_replaces_whole_object() {
        let store = in_memory();
        assert!(store.save(&TokenRecord::new("A", "R", 1).with_extra("scope", "old")).await);
        assert!(store.save(&TokenRecord::new("B", "R2", 2)).await);

        assert_eq!(store.load().await, Some(TokenRecord::new("B", "R2", 2)));
    }

    #[tokio::test]
    async fn document_round_trips_exactly() {
        let store = in_memory();
        let mut document = TokenDocument::new();
        document.insert("access_token".into(), json!("x"));

        store.write_document(&document).await.unwrap();
        assert_eq!(store.read_document().await.unwrap(), Some(document));
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn corrupt_object_loads_as_absent() {
        let backend = Arc::new(InMemory::new());
        backend
            .put(&ObjectPath::from(TOKEN_FILE_NAME), PutPayload::from_static(b"{oops"))
            .await
            .unwrap();
        let store = ObjectTokenStore::new(backend, "test-bucket", TOKEN_FILE_NAME);

        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn upload_failure_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let store = broken(&dir);

        assert!(!store.save(&TokenRecord::new("A", "R", 1)).await);

        let err = store
            .write_document(&TokenDocument::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::StorageUnavailable);
    }

    #[tokio::test]
    async fn download_failure_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(broken(&dir).load().await, None);
    }

    #[tokio::test]
    async fn shares_backend_between_instances() {
        let backend: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let writer = ObjectTokenStore::new(backend.clone(), "b", TOKEN_FILE_NAME);
        let reader = ObjectTokenStore::new(backend, "b", TOKEN_FILE_NAME);

        let record = TokenRecord::new("A", "R", 42);
        assert!(writer.save(&record).await);
        assert_eq!(reader.load().await, Some(record));
    }
}
