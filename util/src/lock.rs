//! A single scoped mutex guarding one plain-data state record.
//!
//! Every long-lived stateful object in this stack (ICE agent, SCTP
//! association, data-channel manager, connection, listener, endpoint) keeps
//! its mutable fields in one such record. Callers acquire the lock only for
//! the critical section and must copy out whatever they need before
//! invoking user callbacks (send, data, continuation-yield) — never while
//! still holding it, to avoid callback reentry under the lock.

use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct StateLock<T> {
    inner: Mutex<T>,
}

impl<T> StateLock<T> {
    pub fn new(state: T) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    /// Run `f` with exclusive access to the state, returning whatever it
    /// produces. `f` must not itself invoke a user callback.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Copy the whole state out of the lock. Cheap escape hatch for
    /// `T: Clone` records read in full before a callback.
    pub fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_section_mutates_in_place() {
        let lock = StateLock::new(0_i32);
        lock.with(|v| *v += 1);
        lock.with(|v| *v += 1);
        assert_eq!(lock.snapshot(), 2);
    }
}
