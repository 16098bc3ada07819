use std::ops::{Bound, RangeBounds};

use super::{BackingStore, Iter, MapStore, Read, Shared, Write, KV};
use crate::Result;

/// A handle to a namespace within a shared backing store.
///
/// Cloning a `Store` is cheap and every clone reads and writes the same
/// underlying data. [Store::sub] derives a handle whose keys are prefixed,
/// which is how keeper modules reserve disjoint key spaces.
#[derive(Clone, Default)]
pub struct Store {
    prefix: Vec<u8>,
    store: BackingStore,
}

impl Store {
    /// Creates a root handle (empty prefix) over the given backing store.
    #[inline]
    pub fn new(store: BackingStore) -> Self {
        Store {
            prefix: vec![],
            store,
        }
    }

    /// Creates a root handle over a fresh in-memory map store.
    pub fn with_map_store() -> Self {
        Self::new(Shared::new(MapStore::new()).into())
    }

    /// Returns a handle whose keys are all prefixed with `prefix`, relative to
    /// this handle.
    #[inline]
    pub fn sub(&self, prefix: &[u8]) -> Self {
        Store {
            prefix: concat(self.prefix.as_slice(), prefix),
            store: self.store.clone(),
        }
    }

    /// The absolute prefix of this handle within its backing store.
    #[inline]
    pub fn prefix(&self) -> &[u8] {
        self.prefix.as_slice()
    }

    /// Iterates over every entry in this namespace, in ascending key order.
    pub fn iter(&self) -> Iter {
        self.range::<Vec<u8>, _>(..)
    }

    /// Iterates over the entries whose keys fall within `bounds`, in ascending
    /// key order. Keys are relative to this handle's prefix.
    pub fn range<K: AsRef<[u8]>, B: RangeBounds<K>>(&self, bounds: B) -> Iter {
        Iter::new(
            self.clone(),
            map_bound(bounds.start_bound()),
            map_bound(bounds.end_bound()),
        )
    }

    /// Iterates over the entries whose keys begin with `prefix`. Yielded keys
    /// still include `prefix`.
    pub fn iter_prefix(&self, prefix: &[u8]) -> Iter {
        let end = match increment(prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        Iter::new(self.clone(), Bound::Included(prefix.to_vec()), end)
    }
}

impl Read for Store {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let prefixed = concat(self.prefix.as_slice(), key);
        self.store.get(prefixed.as_slice())
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        let prefixed = concat(self.prefix.as_slice(), key);
        match self.store.get_next(prefixed.as_slice())? {
            Some((key, value)) if key.starts_with(self.prefix.as_slice()) => {
                Ok(Some((key[self.prefix.len()..].to_vec(), value)))
            }
            _ => Ok(None),
        }
    }
}

impl Write for Store {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let prefixed = concat(self.prefix.as_slice(), key.as_slice());
        self.store.put(prefixed, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let prefixed = concat(self.prefix.as_slice(), key);
        self.store.delete(prefixed.as_slice())
    }
}

#[inline]
fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(a.len() + b.len());
    value.extend_from_slice(a);
    value.extend_from_slice(b);
    value
}

fn map_bound<K: AsRef<[u8]>>(bound: Bound<&K>) -> Bound<Vec<u8>> {
    match bound {
        Bound::Included(key) => Bound::Included(key.as_ref().to_vec()),
        Bound::Excluded(key) => Bound::Excluded(key.as_ref().to_vec()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Returns the smallest key greater than every key beginning with `prefix`,
/// or `None` if no such key exists (empty or all-`0xff` prefix).
fn increment(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
