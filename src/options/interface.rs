use ::anyhow::Result;
use ::serde_json::Value;

/// Key-value repository backing the site registry: peer records, keyword
/// lists, the exclusion set and this instance's own credential all live here
/// under logical names. Writes are atomic per key and nothing more; callers
/// doing read-modify-write accept that two concurrent writers can lose one
/// update.
#[::async_trait::async_trait]
pub trait OptionsStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Value>>;
    async fn set(&self, name: &str, value: Value) -> Result<()>;
    async fn delete(&self, name: &str) -> Result<()>;
}
