use ::anyhow::Result;
use ::serde_json::Value;
use ::std::collections::HashMap;

use crate::options::interface;

/// In-memory provider used by the test suite and the `memory` store
/// interface. State dies with the process.
#[derive(Default)]
pub struct MemoryOptionsStore {
    values: ::tokio::sync::Mutex<HashMap<String, Value>>,
}

impl MemoryOptionsStore {
    pub fn new() -> MemoryOptionsStore {
        MemoryOptionsStore::default()
    }
}

#[::async_trait::async_trait]
impl interface::OptionsStore for MemoryOptionsStore {
    async fn get(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(name).cloned())
    }

    async fn set(&self, name: &str, value: Value) -> Result<()> {
        self.values.lock().await.insert(name.to_string(), value);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.values.lock().await.remove(name);
        Ok(())
    }
}
