//! Token persistence.
//!
//! [`TokenStore`] is the capability the lifecycle manager depends on. Two
//! backends implement it:
//!
//! - [`LocalTokenStore`] writes the record to a fixed file on local disk.
//! - [`ObjectTokenStore`] keeps it under a fixed key in object storage.
//!
//! Both speak the same vocabulary: `save` answers `true`/`false`, `load`
//! answers `Some(record)`/`None`. Failures are logged where they happen and
//! never cross this boundary.

mod local;
mod object;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::BoxFuture;
use crate::error::AuthResult;
use crate::record::TokenRecord;

pub use local::LocalTokenStore;
pub use object::ObjectTokenStore;

/// Default file/object name of the persisted record.
pub const TOKEN_FILE_NAME: &str = "token_info.json";

/// Persists the single live [`TokenRecord`].
///
/// # Contract
///
/// - `save` replaces whatever was stored before. No merge.
/// - `load` on a store that was never written returns `None`.
/// - Neither method fails: backend errors become `false` / `None`.
pub trait TokenStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Overwrites the stored record. Returns false if it was not persisted.
    fn save<'a>(&'a self, record: &'a TokenRecord) -> BoxFuture<'a, bool>;

    /// Returns the stored record, or `None` if there is none or it cannot be read.
    fn load(&self) -> BoxFuture<'_, Option<TokenRecord>>;
}

/// Which backend to persist tokens in. Chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// A file on local disk.
    Local { path: PathBuf },
    /// An object in an S3 bucket.
    Object { bucket: String, key: String },
}

impl StoreBackend {
    /// The default local file: `<temp dir>/token_info.json`.
    pub fn default_local() -> Self {
        Self::Local {
            path: LocalTokenStore::default_path(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Object { .. } => "object",
        }
    }
}

/// Builds the store for `backend`.
///
/// # Errors
///
/// Returns a configuration error if the object store client cannot be
/// created (for example, an invalid bucket name or region).
pub fn open_store(backend: &StoreBackend) -> AuthResult<Arc<dyn TokenStore>> {
    let store: Arc<dyn TokenStore> = match backend {
        StoreBackend::Local { path } => Arc::new(LocalTokenStore::new(path)),
        StoreBackend::Object { bucket, key } => Arc::new(ObjectTokenStore::s3(bucket, key)?),
    };
    info!(backend = store.name(), "token store ready");
    Ok(store)
}
