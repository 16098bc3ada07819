use super::{BufStore, MapStore, Read, ReadWrite, Shared, Store, Write, KV};
use crate::Result;

/// The concrete storage a [Store] handle reads from and writes to.
///
/// The versioned, committing storage engine is provided by the embedding
/// application through the `Other` variant.
#[derive(Clone)]
pub enum BackingStore {
    MapStore(Shared<MapStore>),
    Buffer(Shared<BufStore<Store>>),
    Other(Shared<Box<dyn ReadWrite>>),
}

impl Default for BackingStore {
    fn default() -> Self {
        BackingStore::MapStore(Shared::new(MapStore::new()))
    }
}

impl Read for BackingStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            BackingStore::MapStore(ref store) => store.get(key),
            BackingStore::Buffer(ref store) => store.get(key),
            BackingStore::Other(ref store) => store.get(key),
        }
    }

    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        match self {
            BackingStore::MapStore(ref store) => store.get_next(key),
            BackingStore::Buffer(ref store) => store.get_next(key),
            BackingStore::Other(ref store) => store.get_next(key),
        }
    }
}

impl Write for BackingStore {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        match self {
            BackingStore::MapStore(ref mut store) => store.put(key, value),
            BackingStore::Buffer(ref mut store) => store.put(key, value),
            BackingStore::Other(ref mut store) => store.put(key, value),
        }
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        match self {
            BackingStore::MapStore(ref mut store) => store.delete(key),
            BackingStore::Buffer(ref mut store) => store.delete(key),
            BackingStore::Other(ref mut store) => store.delete(key),
        }
    }
}

impl From<Shared<MapStore>> for BackingStore {
    fn from(store: Shared<MapStore>) -> Self {
        BackingStore::MapStore(store)
    }
}

impl From<Shared<BufStore<Store>>> for BackingStore {
    fn from(store: Shared<BufStore<Store>>) -> Self {
        BackingStore::Buffer(store)
    }
}

impl From<Shared<Box<dyn ReadWrite>>> for BackingStore {
    fn from(store: Shared<Box<dyn ReadWrite>>) -> Self {
        BackingStore::Other(store)
    }
}
