use std::collections::BTreeMap;
use std::ops::Bound;

use super::{Flush, Read, Write, KV};
use crate::Result;

/// An in-memory map containing values modified by writes to a `BufStore`.
/// Deletions are recorded as `None` so they shadow the underlying store.
pub type Map = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Wraps a store and records mutations in an in-memory map, so that
/// modifications do not affect the underlying store until `flush` is called.
///
/// Dropping a `BufStore` without flushing discards every write made through
/// it, which is how a failed operation is rolled back.
pub struct BufStore<S> {
    map: Map,
    store: S,
}

impl<S> BufStore<S> {
    /// Constructs a `BufStore` by wrapping the given store.
    ///
    /// Calls to get will first check the `BufStore` map, and if no entry is
    /// found will be passed to the underlying store.
    pub fn wrap(store: S) -> Self {
        BufStore {
            store,
            map: Default::default(),
        }
    }

    /// Consumes the `BufStore` and returns its in-memory buffer of key/value
    /// entries.
    pub fn into_map(self) -> Map {
        self.map
    }

    /// Number of buffered writes (including deletions).
    pub fn pending(&self) -> usize {
        self.map.len()
    }
}

impl<S: Read> Read for BufStore<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.map.get(key) {
            Some(Some(value)) => Ok(Some(value.clone())),
            Some(None) => Ok(None),
            None => self.store.get(key),
        }
    }

    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        let mut cursor = key.to_vec();
        loop {
            let map_next = self
                .map
                .range::<[u8], _>((Bound::Excluded(cursor.as_slice()), Bound::Unbounded))
                .next();
            let backing_next = self.store.get_next(cursor.as_slice())?;

            let (map_key, map_value) = match map_next {
                None => return Ok(backing_next),
                Some(entry) => entry,
            };

            // backing entry comes first and is not shadowed
            if let Some((backing_key, _)) = &backing_next {
                if backing_key < map_key {
                    return Ok(backing_next);
                }
            }

            match map_value {
                Some(value) => return Ok(Some((map_key.clone(), value.clone()))),
                // deleted in the buffer, keep scanning past it
                None => cursor = map_key.clone(),
            }
        }
    }
}

impl<S: Read> Write for BufStore<S> {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.map.insert(key, Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.map.insert(key.to_vec(), None);
        Ok(())
    }
}

impl<S: Write> Flush for BufStore<S> {
    /// Consumes the `BufStore`'s in-memory buffer and writes all of its values
    /// to the underlying store.
    ///
    /// After calling `flush`, the `BufStore` will still be valid and wrap the
    /// underlying store, but its in-memory buffer will be empty.
    fn flush(&mut self) -> Result<()> {
        while let Some((key, value)) = self.map.pop_first() {
            match value {
                Some(value) => self.store.put(key, value)?,
                None => self.store.delete(key.as_slice())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MapStore;

    #[test]
    fn get_shadows_backing() {
        let mut backing = MapStore::new();
        backing.put(vec![1], vec![1]).unwrap();
        backing.put(vec![2], vec![2]).unwrap();

        let mut buf = BufStore::wrap(backing);
        buf.put(vec![1], vec![10]).unwrap();
        buf.delete(&[2]).unwrap();

        assert_eq!(buf.get(&[1]).unwrap(), Some(vec![10]));
        assert_eq!(buf.get(&[2]).unwrap(), None);
    }

    #[test]
    fn get_next_merges() {
        let mut store = MapStore::new();
        store.put(vec![0], vec![0]).unwrap();
        store.put(vec![1], vec![0]).unwrap();
        store.put(vec![2], vec![0]).unwrap();
        store.put(vec![4], vec![0]).unwrap();

        let mut buf = BufStore::wrap(store);
        buf.put(vec![1], vec![1]).unwrap();
        buf.delete(&[2]).unwrap();
        buf.put(vec![3], vec![1]).unwrap();

        assert_eq!(buf.get_next(&[]).unwrap(), Some((vec![0], vec![0])));
        assert_eq!(buf.get_next(&[0]).unwrap(), Some((vec![1], vec![1])));
        assert_eq!(buf.get_next(&[1]).unwrap(), Some((vec![3], vec![1])));
        assert_eq!(buf.get_next(&[3]).unwrap(), Some((vec![4], vec![0])));
        assert_eq!(buf.get_next(&[4]).unwrap(), None);
    }

    #[test]
    fn flush() {
        let mut buf = BufStore::wrap(MapStore::new());
        buf.put(vec![1], vec![1]).unwrap();
        buf.put(vec![2], vec![2]).unwrap();
        buf.delete(&[2]).unwrap();
        assert_eq!(buf.pending(), 2);

        buf.flush().unwrap();
        assert_eq!(buf.pending(), 0);
        assert_eq!(buf.get(&[1]).unwrap(), Some(vec![1]));
        assert_eq!(buf.into_map().len(), 0);
    }

    #[test]
    fn drop_discards_writes() {
        let mut backing = MapStore::new();
        backing.put(vec![1], vec![1]).unwrap();

        let mut buf = BufStore::wrap(&mut backing);
        buf.delete(&[1]).unwrap();
        buf.put(vec![2], vec![2]).unwrap();
        drop(buf);

        assert_eq!(backing.get(&[1]).unwrap(), Some(vec![1]));
        assert_eq!(backing.get(&[2]).unwrap(), None);
    }
}
