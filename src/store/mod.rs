pub mod disk;
pub mod memory;

use crate::core::cache::KeyValueCollection;
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::warn;

/// Hands out named collections, persisted on disk when a keyspace could be
/// opened and held in memory otherwise.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Arc<Keyspace>>,
}

impl KeyValueStore {
    pub fn open(data_path: &Path) -> Self {
        let cache_dir = data_path.join("cache");
        let keyspace = match fjall::Config::new(&cache_dir).open() {
            Ok(keyspace) => Some(Arc::new(keyspace)),
            Err(e) => {
                warn!(
                    error = %e,
                    path = %cache_dir.display(),
                    "Could not open cache directory, falling back to memory"
                );
                None
            }
        };

        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }

    /// Returns the collection called `name`, creating it on first use.
    pub fn collection(&self, name: &str) -> Arc<dyn KeyValueCollection> {
        if let Some(existing) = self
            .collections
            .read()
            .ok()
            .and_then(|collections| collections.get(name).cloned())
        {
            return existing;
        }

        let created: Arc<dyn KeyValueCollection> = self
            .keyspace
            .as_ref()
            .and_then(|ks| {
                ks.open_partition(name, PartitionCreateOptions::default())
                    .map_err(|e| warn!(error = %e, partition = name, "Could not open partition"))
                    .ok()
                    .map(|partition| {
                        Arc::new(DiskCollection::new(Arc::clone(ks), partition))
                            as Arc<dyn KeyValueCollection>
                    })
            })
            .unwrap_or_else(|| Arc::new(MemoryCollection::new()));

        match self.collections.write() {
            Ok(mut collections) => Arc::clone(
                collections
                    .entry(name.to_string())
                    .or_insert(created),
            ),
            Err(_) => created,
        }
    }
}
