//! Exclusive write-intent locks keyed by owner.
//!
//! A lock is either free or held by exactly one owner (a job key). Acquiring a
//! lock held by somebody else fails with `ErrorKind::Locked` instead of
//! blocking, so a second job cannot silently queue behind a long run. The only
//! wait is for an outside write already in progress to finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{AppError, ErrorKind};

#[derive(Debug)]
pub struct WriteLock {
    name: String,
    owner: Mutex<Option<String>>,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

impl WriteLock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: Mutex::new(None),
            acquisitions: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    pub fn try_acquire(&self, owner: &str) -> Result<(), AppError> {
        let mut slot = self.owner.lock();
        if let Some(current) = slot.as_deref() {
            return Err(AppError::new(
                ErrorKind::Locked,
                format!("'{}' is locked by {current}.", self.name),
            ));
        }
        *slot = Some(owner.to_string());
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Release the lock if `owner` holds it. Returns whether anything was released.
    pub fn release(&self, owner: &str) -> bool {
        let mut slot = self.owner.lock();
        if slot.as_deref() != Some(owner) {
            return false;
        }
        *slot = None;
        self.releases.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Run `write` on behalf of `who`, or fail with `Locked` when another owner
    /// holds the lock. The owner slot stays held while `write` runs, so no
    /// owner can acquire the lock between the check and the write.
    pub fn with_writable<R>(&self, who: &str, write: impl FnOnce() -> Result<R, AppError>) -> Result<R, AppError> {
        let slot = self.owner.lock();
        match slot.as_deref() {
            Some(current) if current != who => Err(AppError::new(
                ErrorKind::Locked,
                format!("'{}' is locked by {current}; write by {who} denied.", self.name),
            )),
            _ => write(),
        }
    }

    pub fn locked_by(&self) -> Option<String> {
        self.owner.lock().clone()
    }

    pub fn is_locked(&self) -> bool {
        self.owner.lock().is_some()
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Anything that embeds a [`WriteLock`].
pub trait Lockable: Send + Sync {
    fn write_lock_state(&self) -> &WriteLock;
}

/// Holds a lock on an `Arc<T>` and releases it exactly once, on `release()`
/// or on drop, whichever comes first.
#[derive(Debug)]
pub struct LockGuard<T: Lockable> {
    target: Arc<T>,
    owner: String,
    released: bool,
}

impl<T: Lockable> LockGuard<T> {
    pub fn acquire(target: Arc<T>, owner: &str) -> Result<Self, AppError> {
        target.write_lock_state().try_acquire(owner)?;
        Ok(Self {
            target,
            owner: owner.to_string(),
            released: false,
        })
    }

    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.target.write_lock_state().release(&self.owner);
        }
    }
}

impl<T: Lockable> Drop for LockGuard<T> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thing(WriteLock);

    impl Lockable for Thing {
        fn write_lock_state(&self) -> &WriteLock {
            &self.0
        }
    }

    #[test]
    fn second_owner_is_denied() {
        let lock = WriteLock::new("frame");
        lock.try_acquire("job_1").unwrap();
        let err = lock.try_acquire("job_2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Locked);
        assert!(lock.with_writable("job_2", || Ok(())).is_err());
        assert_eq!(lock.with_writable("job_1", || Ok(7)).unwrap(), 7);
    }

    #[test]
    fn acquire_waits_for_a_write_in_progress() {
        let lock = Arc::new(WriteLock::new("frame"));

        let contender = lock
            .with_writable("writer", || {
                let contender = {
                    let lock = lock.clone();
                    std::thread::spawn(move || lock.try_acquire("job_1"))
                };
                std::thread::sleep(std::time::Duration::from_millis(50));
                assert!(!contender.is_finished());
                assert_eq!(lock.acquisitions(), 0);
                Ok(contender)
            })
            .unwrap();

        contender.join().unwrap().unwrap();
        assert_eq!(lock.locked_by().as_deref(), Some("job_1"));
    }

    #[test]
    fn release_by_non_owner_is_ignored() {
        let lock = WriteLock::new("frame");
        lock.try_acquire("job_1").unwrap();
        assert!(!lock.release("job_2"));
        assert_eq!(lock.locked_by().as_deref(), Some("job_1"));
        assert!(lock.release("job_1"));
        assert!(!lock.is_locked());
    }

    #[test]
    fn guard_releases_once() {
        let thing = Arc::new(Thing(WriteLock::new("thing")));
        let guard = LockGuard::acquire(thing.clone(), "job_1").unwrap();
        assert!(thing.0.is_locked());
        guard.release();
        assert!(!thing.0.is_locked());
        assert_eq!(thing.0.releases(), 1);

        {
            let _guard = LockGuard::acquire(thing.clone(), "job_2").unwrap();
        }
        assert_eq!(thing.0.releases(), 2);
        assert_eq!(thing.0.acquisitions(), 2);
    }
}
