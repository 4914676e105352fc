use crate::StoreResult;
use async_trait::async_trait;

/// Physical key-value store shared by every namespace.
///
/// Keys reaching a backend are already namespaced. Implementations must be
/// safe for concurrent use.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Write every pair in one round trip.
    async fn mset(&self, pairs: &[(String, String)]) -> StoreResult<()>;

    /// Read values in key order; missing keys yield `None`.
    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>>;

    /// Delete keys; absent keys are ignored.
    async fn del(&self, keys: &[String]) -> StoreResult<()>;

    /// List every key starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}
