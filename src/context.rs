use crate::store::{BackingStore, BufStore, Flush, Shared, Store};
use crate::Result;

/// The block environment a keeper call executes in.
///
/// Every keeper operation takes a `&mut Context` rather than reading ambient
/// state, so the state machine is a function of the prior store contents,
/// the block height and time, and the call's arguments.
#[derive(Clone)]
pub struct Context {
    /// Height of the block being processed.
    pub height: u64,
    /// Block time, in seconds since the Unix epoch.
    pub time_seconds: i64,
    /// Root store handle for this execution.
    pub store: Store,
}

impl Context {
    pub fn new(store: Store, height: u64, time_seconds: i64) -> Self {
        Context {
            height,
            time_seconds,
            store,
        }
    }

    /// A context over a fresh in-memory store, at height 0 and time 0.
    pub fn in_memory() -> Self {
        Self::new(Store::with_map_store(), 0, 0)
    }

    /// Moves the context to a new block.
    pub fn begin_block(&mut self, height: u64, time_seconds: i64) {
        self.height = height;
        self.time_seconds = time_seconds;
    }

    /// Runs `op` against a buffered view of the store, committing its writes
    /// only if it returns `Ok`. On `Err` the store is left untouched.
    pub fn transact<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Context) -> Result<T>,
    {
        let buf = Shared::new(BufStore::wrap(self.store.clone()));
        let mut child = Context {
            height: self.height,
            time_seconds: self.time_seconds,
            store: Store::new(BackingStore::Buffer(buf.clone())),
        };

        let res = op(&mut child)?;
        drop(child);
        buf.borrow_mut()?.flush()?;

        Ok(res)
    }
}
