//! A keyed, lockable frame shared between the ICE job and outside writers.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::data::frame::Frame;
use crate::data::lock::{LockGuard, Lockable, WriteLock};
use crate::error::AppError;

#[derive(Debug)]
pub struct Dataset {
    key: String,
    frame: RwLock<Frame>,
    lock: WriteLock,
}

impl Dataset {
    pub fn new(key: impl Into<String>, frame: Frame) -> Arc<Self> {
        let key = key.into();
        Arc::new(Self {
            lock: WriteLock::new(format!("dataset {key}")),
            key,
            frame: RwLock::new(frame),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Readers are never blocked by the write-intent lock.
    pub fn read(&self) -> RwLockReadGuard<'_, Frame> {
        self.frame.read()
    }

    /// Mutate the frame on behalf of `writer`.
    ///
    /// Denied with `ErrorKind::Locked` while another owner holds the lock.
    pub fn update<R>(&self, writer: &str, f: impl FnOnce(&mut Frame) -> Result<R, AppError>) -> Result<R, AppError> {
        self.lock.with_writable(writer, || {
            let mut frame = self.frame.write();
            f(&mut frame)
        })
    }

    pub fn write_lock(self: &Arc<Self>, owner: &str) -> Result<LockGuard<Dataset>, AppError> {
        LockGuard::acquire(Arc::clone(self), owner)
    }

    pub fn locked_by(&self) -> Option<String> {
        self.lock.locked_by()
    }

    pub fn lock_state(&self) -> &WriteLock {
        &self.lock
    }
}

impl Lockable for Dataset {
    fn write_lock_state(&self) -> &WriteLock {
        &self.lock
    }
}
