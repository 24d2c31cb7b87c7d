use crate::storage::objects::{is_valid_object_name, Bucket, ObjectStore};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

/// In-process object store. Listing order falls out of the `BTreeMap`.
#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<HashMap<Bucket, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn ensure_bucket(&self, bucket: Bucket) -> anyhow::Result<()> {
        self.buckets.lock().await.entry(bucket).or_default();
        Ok(())
    }

    async fn list(&self, bucket: Bucket) -> anyhow::Result<Vec<String>> {
        let buckets = self.buckets.lock().await;
        Ok(buckets
            .get(&bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, bucket: Bucket, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let buckets = self.buckets.lock().await;
        Ok(buckets.get(&bucket).and_then(|objects| objects.get(name).cloned()))
    }

    async fn put(&self, bucket: Bucket, name: &str, data: &[u8]) -> anyhow::Result<()> {
        if !is_valid_object_name(name) {
            return Err(anyhow::anyhow!("invalid object name '{}'", name));
        }
        self.buckets
            .lock()
            .await
            .entry(bucket)
            .or_default()
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }
}
