use std::collections::BTreeMap;
use std::ops::Bound;

use super::{Read, Write, KV};
use crate::Result;

/// A simple in-memory store backed by an ordered map.
#[derive(Default, Clone, Debug)]
pub struct MapStore(BTreeMap<Vec<u8>, Vec<u8>>);

impl MapStore {
    pub fn new() -> MapStore {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Read for MapStore {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.0.get(key).cloned())
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        Ok(self
            .0
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl Write for MapStore {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.0.insert(key, value);
        Ok(())
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.0.remove(key);
        Ok(())
    }
}
