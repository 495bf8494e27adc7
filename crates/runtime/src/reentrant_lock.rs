// Copyright (c) 2026 ArkVM contributors, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};
use std::thread::{self, ThreadId};

/// The re-entrant per-VM mutex of spec.md §4.6/§5/§9: `call`/`resolve` can
/// nest (native proc → script → native proc) on the same host thread, and
/// the lock must not deadlock that thread against itself.
///
/// Reentrancy is tracked by thread id and a depth counter; the payload is
/// handed out through an `UnsafeCell`. Soundness rests on a discipline the
/// rest of this crate upholds and does not otherwise enforce: a thread
/// never keeps a live `&mut T` borrowed from one guard while acquiring a
/// second, nested guard — the dispatch loop drops its guard before calling
/// into native code and only re-acquires once that call returns (see
/// `vm::Vm::drive`).
pub struct ReentrantLock<T> {
    owner: Mutex<Option<Owner>>,
    condvar: Condvar,
    data: UnsafeCell<T>,
}

struct Owner {
    thread: ThreadId,
    depth: usize,
}

unsafe impl<T: Send> Send for ReentrantLock<T> {}
unsafe impl<T: Send> Sync for ReentrantLock<T> {}

impl<T> ReentrantLock<T> {
    pub fn new(value: T) -> Self {
        ReentrantLock { owner: Mutex::new(None), condvar: Condvar::new(), data: UnsafeCell::new(value) }
    }

    pub fn lock(&self) -> ReentrantGuard<'_, T> {
        let this_thread = thread::current().id();
        let mut owner = self.owner.lock().expect("reentrant lock owner mutex poisoned");
        loop {
            match owner.as_mut() {
                Some(o) if o.thread == this_thread => {
                    o.depth += 1;
                    break;
                }
                None => {
                    *owner = Some(Owner { thread: this_thread, depth: 1 });
                    break;
                }
                Some(_) => {
                    owner = self
                        .condvar
                        .wait(owner)
                        .expect("reentrant lock owner mutex poisoned");
                }
            }
        }
        ReentrantGuard { lock: self }
    }
}

/// RAII guard returned by [`ReentrantLock::lock`]. Dropping the last live
/// guard on a given thread releases the lock and wakes one waiter.
pub struct ReentrantGuard<'a, T> {
    lock: &'a ReentrantLock<T>,
}

impl<'a, T> Deref for ReentrantGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for ReentrantGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for ReentrantGuard<'a, T> {
    fn drop(&mut self) {
        let mut owner = self.lock.owner.lock().expect("reentrant lock owner mutex poisoned");
        if let Some(o) = owner.as_mut() {
            o.depth -= 1;
            if o.depth == 0 {
                *owner = None;
                self.lock.condvar.notify_one();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn reentrant_lock_allows_same_thread_to_relock() {
        let lock = ReentrantLock::new(0i32);
        let outer = lock.lock();
        let mut inner = lock.lock();
        *inner += 1;
        drop(inner);
        assert_eq!(*outer, 1);
    }

    #[test]
    fn reentrant_lock_serializes_across_threads() {
        let lock = Arc::new(ReentrantLock::new(0i32));
        let guard = lock.lock();
        let other = Arc::clone(&lock);
        let handle = std::thread::spawn(move || {
            let mut g = other.lock();
            *g += 1;
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(*guard, 0);
        drop(guard);
        handle.join().unwrap();
        assert_eq!(*lock.lock(), 1);
    }
}
