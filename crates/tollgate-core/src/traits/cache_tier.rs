use crate::errors::TollgateResult;
use crate::models::CacheItem;

/// One storage tier of the cache. Values are held as JSON so a single tier
/// can back values of any serializable type.
///
/// Keys passed here are already namespaced by the owning store.
pub trait ICacheTier: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn read(&self, key: &str) -> TollgateResult<Option<CacheItem<serde_json::Value>>>;

    fn write(&self, key: &str, item: &CacheItem<serde_json::Value>) -> TollgateResult<()>;

    /// Remove one key. Returns whether it was present.
    fn remove(&self, key: &str) -> TollgateResult<bool>;

    /// Every key currently stored whose name starts with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> TollgateResult<Vec<String>>;
}
