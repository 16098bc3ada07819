//! Low-level key/value store abstraction.
//!
//! Keeper state lives in an ordered byte-key store. Everything above this
//! module talks to a [Store], a cheaply-clonable handle which namespaces its
//! keys under a prefix and forwards reads and writes to a shared
//! [BackingStore].

use crate::Result;

mod backingstore;
mod bufstore;
mod error;
mod iter;
mod mapstore;
mod share;
#[allow(clippy::module_inception)]
mod store;

pub use backingstore::BackingStore;
pub use bufstore::{BufStore, Map};
pub use error::Error;
pub use iter::Iter;
pub use mapstore::MapStore;
pub use share::Shared;
pub use store::Store;

/// A key/value entry.
pub type KV = (Vec<u8>, Vec<u8>);

/// Trait for read access to key/value stores.
pub trait Read {
    /// Gets a value by key.
    ///
    /// Implementations of `get` should return `None` when there is no value
    /// for the key rather than returning `Err`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Gets the first entry whose key is strictly greater than `key`, or
    /// `None` if there is no such entry.
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>>;
}

/// Trait for write access to key/value stores.
pub trait Write: Read {
    /// Writes a key and value to the store.
    ///
    /// If a value already exists for the given key, implementations should
    /// overwrite the value.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Deletes the value with the given key.
    ///
    /// If no value exists for the given key, implementations should treat the
    /// operation as a no-op (but may still issue a call to `delete` to an
    /// underlying store).
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// A store which supports both reads and writes, usable as a trait object.
pub trait ReadWrite: Read + Write {}

impl<T: Read + Write> ReadWrite for T {}

/// A store which buffers writes and can commit them to an underlying store.
pub trait Flush {
    fn flush(&mut self) -> Result<()>;
}

impl<T: Read + ?Sized> Read for &mut T {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        (**self).get_next(key)
    }
}

impl<T: Write + ?Sized> Write for &mut T {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }
}

impl<T: Read + ?Sized> Read for Box<T> {
    #[inline]
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    #[inline]
    fn get_next(&self, key: &[u8]) -> Result<Option<KV>> {
        (**self).get_next(key)
    }
}

impl<T: Write + ?Sized> Write for Box<T> {
    #[inline]
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }
}
