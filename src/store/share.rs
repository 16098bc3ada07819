use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use super::{Error, Read, Write, KV};
use crate::Result;

/// A shared reference to a store, allowing the store to be cloned and read
/// from or written to by multiple consumers.
///
/// `Shared` has a similar purpose to `Rc<RefCell<T>>`, but implements the
/// store traits so it can be used directly as a store. Borrow conflicts are
/// reported as store errors rather than panics.
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    /// Constructs a `Shared` by wrapping the given store.
    pub fn new(inner: T) -> Self {
        Shared(Rc::new(RefCell::new(inner)))
    }

    /// Borrows the inner store.
    pub fn borrow(&self) -> Result<Ref<T>> {
        Ok(self.0.try_borrow().map_err(|_| Error::BorrowMut)?)
    }

    /// Mutably borrows the inner store.
    pub fn borrow_mut(&self) -> Result<RefMut<T>> {
        Ok(self.0.try_borrow_mut().map_err(|_| Error::Borrow)?)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Shared<T> {
        Self(self.0.clone())
    }
}

impl<R: Read> Read for Shared<R> {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.borrow()?.get(key)
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        self.borrow()?.get_next(key)
    }
}

impl<W: Write> Write for Shared<W> {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.borrow_mut()?.put(key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.borrow_mut()?.delete(key)
    }
}
