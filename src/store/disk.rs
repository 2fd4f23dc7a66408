use crate::core::cache::KeyValueCollection;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use std::sync::Arc;
use tracing::debug;

/// A collection backed by one fjall partition.
pub struct DiskCollection {
    keyspace: Arc<Keyspace>,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(keyspace: Arc<Keyspace>, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.partition.get(key) {
            Ok(Some(value)) => {
                debug!("Cache HIT for key: {}", String::from_utf8_lossy(key));
                Some(value.to_vec())
            }
            Ok(None) => {
                debug!("Cache MISS for key: {}", String::from_utf8_lossy(key));
                None
            }
            Err(e) => {
                debug!("DiskCollection get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) {
        let res = self
            .partition
            .insert(key, value)
            .and_then(|_| self.keyspace.persist(PersistMode::SyncAll));
        match res {
            Ok(()) => debug!("Cache PUT for key: {}", String::from_utf8_lossy(key)),
            Err(e) => debug!("DiskCollection put error: {}", e),
        }
    }
}
