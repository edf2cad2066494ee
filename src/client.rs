pub mod edge_config;

use async_trait::async_trait;

use crate::core::document::Document;
use crate::error::StoreResult;

/// Remote key-value store holding the persisted document.
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key` yet.
    async fn get(&self, key: &str) -> StoreResult<Option<Document>>;

    async fn set(&self, key: &str, value: &Document) -> StoreResult<()>;
}
