//! The run's output slot: result tables appended as columns complete, plus the
//! run-level lock held for the lifetime of the job.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::data::{Lockable, WriteLock};
use crate::domain::IceTable;

#[derive(Debug)]
pub struct IceOutput {
    key: String,
    tables: RwLock<Vec<IceTable>>,
    lock: WriteLock,
}

impl IceOutput {
    pub fn new(key: impl Into<String>) -> Arc<Self> {
        let key = key.into();
        Arc::new(Self {
            lock: WriteLock::new(format!("ice output {key}")),
            key,
            tables: RwLock::new(Vec::new()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn push(&self, table: IceTable) {
        self.tables.write().push(table);
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the tables assembled so far.
    pub fn snapshot(&self) -> Vec<IceTable> {
        self.tables.read().clone()
    }

    pub fn lock_state(&self) -> &WriteLock {
        &self.lock
    }
}

impl Lockable for IceOutput {
    fn write_lock_state(&self) -> &WriteLock {
        &self.lock
    }
}
