//! Local file backend.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, error, warn};

use super::{TOKEN_FILE_NAME, TokenStore};
use crate::BoxFuture;
use crate::error::{AuthError, AuthResult};
use crate::record::{TokenDocument, TokenRecord};

/// Stores the token record as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct LocalTokenStore {
    path: PathBuf,
}

impl LocalTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<temp dir>/token_info.json`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(TOKEN_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `document` to disk, replacing any previous content.
    ///
    /// Every write stages into its own private temp file next to the target
    /// and is renamed into place, so readers never observe a half-written
    /// record and concurrent writers never share a staging file.
    pub async fn write_document(&self, document: &TokenDocument) -> AuthResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await.map_err(|e| {
            AuthError::internal(format!("failed to create token directory {}", dir.display()))
                .with_source(e)
        })?;

        let content = serde_json::to_vec_pretty(document).map_err(|e| {
            AuthError::internal("failed to serialize token document").with_source(e)
        })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&dir, &path, &content))
            .await
            .map_err(|e| AuthError::internal("token write task failed").with_source(e))??;

        debug!(path = %self.path.display(), "wrote token document");
        Ok(())
    }

    /// Reads the raw document. `Ok(None)` if the file does not exist.
    pub async fn read_document(&self) -> AuthResult<Option<TokenDocument>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::internal(format!(
                    "failed to read {}",
                    self.path.display()
                ))
                .with_source(e));
            }
        };

        let document = serde_json::from_slice(&content).map_err(|e| {
            AuthError::invalid_response(format!("{} is not a JSON object", self.path.display()))
                .with_source(e)
        })?;
        Ok(Some(document))
    }
}

impl TokenStore for LocalTokenStore {
    fn name(&self) -> &str {
        "local"
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
            match self.write_document(&document).await {
                Ok(()) => true,
                Err(e) => {
                    error!(error = ?e, "failed to save token record");
                    false
                }
            }
        })
    }

    fn load(&self) -> BoxFuture<'_, Option<TokenRecord>> {
        Box::pin(async move {
            let document = match self.read_document().await {
                Ok(Some(document)) => document,
                Ok(None) => {
                    warn!(path = %self.path.display(), "token file not found");
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
                    warn!(path = %self.path.display(), error = %e, "ignoring incomplete token record");
                    None
                }
            }
        })
    }
}

/// Stages `content` in a fresh temp file inside `dir`, then renames it over
/// `path`. The temp file is created with mode 0600 on unix.
fn replace_file(dir: &Path, path: &Path, content: &[u8]) -> AuthResult<()> {
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| {
        AuthError::internal(format!("failed to create temp file in {}", dir.display()))
            .with_source(e)
    })?;
    staged
        .write_all(content)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| {
            AuthError::internal(format!("failed to write {}", staged.path().display()))
                .with_source(e)
        })?;
    staged.persist(path).map_err(|e| {
        AuthError::internal(format!("failed to move token file into {}", path.display()))
            .with_source(e.error)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn store_in(dir: &tempfile::TempDir) -> LocalTokenStore {
        LocalTokenStore::new(dir.path().join(TOKEN_FILE_NAME))
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let record = TokenRecord::new("A", "R", 1_700_000_000)
            .with_extra("scope", "user-library-read")
            .with_extra("token_type", "Bearer");

        assert!(store.save(&record).await);
        assert_eq!(store.load().await, Some(record));
    }

    #[tokio::test]
    async fn load_without_save_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load().await, None);
    }

    #[tokio::test]
    async fn save_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let first = TokenRecord::new("A", "R", 1).with_extra("scope", "old");
        let second = TokenRecord::new("B", "R2", 2);
        assert!(store.save(&first).await);
        assert!(store.save(&second).await);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, second);
        assert!(!loaded.extra.contains_key("scope"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_leave_one_complete_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir));
        let records: Vec<TokenRecord> = (0..8)
            .map(|i| {
                TokenRecord::new(format!("access-{}", "x".repeat(i * 40)), "R", i as i64)
                    .with_extra("writer", i as i64)
            })
            .collect();

        for _ in 0..50 {
            let saves: Vec<_> = records
                .iter()
                .cloned()
                .map(|record| {
                    let store = store.clone();
                    tokio::spawn(async move { store.save(&record).await })
                })
                .collect();
            for save in saves {
                assert!(save.await.unwrap());
            }

            let loaded = store.load().await.unwrap();
            assert!(records.contains(&loaded));
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn document_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut document = TokenDocument::new();
        document.insert("access_token".into(), json!("x"));

        store.write_document(&document).await.unwrap();
        assert_eq!(store.read_document().await.unwrap(), Some(document));
    }

    #[tokio::test]
    async fn partial_document_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut document = TokenDocument::new();
        document.insert("access_token".into(), json!("x"));
        store.write_document(&document).await.unwrap();

        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn garbage_file_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), b"not json").unwrap();

        assert!(store.read_document().await.is_err());
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalTokenStore::new(dir.path().join("nested").join(TOKEN_FILE_NAME));

        assert!(store.save(&TokenRecord::new("A", "R", 1)).await);
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn unwritable_path_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let store = LocalTokenStore::new(blocker.join(TOKEN_FILE_NAME));

        assert!(!store.save(&TokenRecord::new("A", "R", 1)).await);
        assert_eq!(store.load().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.save(&TokenRecord::new("A", "R", 1)).await);

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
