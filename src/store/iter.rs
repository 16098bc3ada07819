use std::ops::Bound;

use super::{Read, Store, KV};
use crate::Result;

/// An iterator over the entries of a [Store] within a key range, built on
/// repeated [Read::get_next] calls so it observes buffered writes.
///
/// The iterator holds its own handle to the store and re-reads on every
/// step, so callers must not rely on it reflecting writes made to the range
/// while it is being consumed. Keeper code collects the entries it needs
/// before mutating.
pub struct Iter {
    store: Store,
    start: Bound<Vec<u8>>,
    end: Bound<Vec<u8>>,
    done: bool,
}

impl Iter {
    pub(super) fn new(store: Store, start: Bound<Vec<u8>>, end: Bound<Vec<u8>>) -> Self {
        Iter {
            store,
            start,
            end,
            done: false,
        }
    }

    fn next_entry(&self) -> Result<Option<KV>> {
        let inclusive = match &self.start {
            Bound::Excluded(key) => return self.store.get_next(key.as_slice()),
            Bound::Included(key) => key.as_slice(),
            Bound::Unbounded => &[],
        };

        match self.store.get(inclusive)? {
            Some(value) => Ok(Some((inclusive.to_vec(), value))),
            None => self.store.get_next(inclusive),
        }
    }

    fn before_end(&self, key: &[u8]) -> bool {
        match &self.end {
            Bound::Included(end) => key <= end.as_slice(),
            Bound::Excluded(end) => key < end.as_slice(),
            Bound::Unbounded => true,
        }
    }
}

impl Iterator for Iter {
    type Item = Result<KV>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_entry() {
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Ok(Some((key, value))) => {
                if !self.before_end(key.as_slice()) {
                    self.done = true;
                    return None;
                }
                self.start = Bound::Excluded(key.clone());
                Some(Ok((key, value)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{Store, Write};
    use crate::Result;

    fn keys(iter: super::Iter) -> Vec<Vec<u8>> {
        iter.map(|entry| entry.map(|(key, _)| key))
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn ranges() {
        let mut store = Store::with_map_store();
        for i in 0..5u8 {
            store.put(vec![i], vec![i]).unwrap();
        }

        assert_eq!(keys(store.iter()).len(), 5);
        assert_eq!(keys(store.range(vec![1]..vec![3])), vec![vec![1], vec![2]]);
        assert_eq!(
            keys(store.range(vec![1]..=vec![3])),
            vec![vec![1], vec![2], vec![3]]
        );
        assert_eq!(keys(store.range(vec![3]..)), vec![vec![3], vec![4]]);
    }

    #[test]
    fn empty_key_included() {
        let mut store = Store::with_map_store();
        store.put(vec![7], vec![0]).unwrap();
        store.put(vec![7, 1], vec![1]).unwrap();

        let sub = store.sub(&[7]);
        assert_eq!(keys(sub.iter()), vec![vec![], vec![1]]);
    }
}
