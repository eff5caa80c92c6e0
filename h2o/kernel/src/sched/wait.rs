mod queue;

use alloc::{collections::VecDeque, sync::Arc};
use core::{
    sync::atomic::{AtomicBool, Ordering::*},
    time::Duration,
};
use std::time::Instant;

use crossbeam_utils::sync::{Parker, Unparker};
use lpc_call::{Error, Result};
use spin::Mutex;

pub use self::queue::WaitQueue;

/// Converts a relative timeout into an absolute deadline. [`Duration::MAX`]
/// (or anything too far in the future to represent) means no deadline.
#[inline]
pub fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

#[derive(Debug)]
struct Waiter {
    unparker: Unparker,
    fired: AtomicBool,
}

impl Waiter {
    /// Returns `true` if this call fired the waiter.
    #[inline]
    fn fire(&self) -> bool {
        !self.fired.swap(true, AcqRel)
    }

    #[inline]
    fn is_fired(&self) -> bool {
        self.fired.load(Acquire)
    }
}

#[derive(Debug)]
pub struct WaitObject {
    wait_queue: Mutex<VecDeque<Arc<Waiter>>>,
}

impl WaitObject {
    #[inline]
    pub fn new() -> Self {
        WaitObject {
            wait_queue: Mutex::new(VecDeque::new()),
        }
    }

    /// The number of threads currently registered on the object.
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.wait_queue.lock().len()
    }

    /// Fire `waiter` on behalf of its own thread and unregister it. Returns
    /// `false` if a notifier got there first.
    fn cancel(&self, waiter: &Arc<Waiter>) -> bool {
        if !waiter.fire() {
            return false;
        }
        self.wait_queue
            .lock()
            .retain(|other| !Arc::ptr_eq(other, waiter));
        true
    }

    /// Block the current thread until notified, `ready` returns `true` at
    /// registration, or `deadline` passes.
    ///
    /// # Errors
    ///
    /// Returns `ETIME` if the deadline passed without a notification.
    pub fn wait<F>(&self, deadline: Option<Instant>, ready: F, block_desc: &'static str) -> Result
    where
        F: FnOnce() -> bool,
    {
        let parker = Parker::new();
        let waiter = Arc::new(Waiter {
            unparker: parker.unparker().clone(),
            fired: AtomicBool::new(false),
        });
        self.wait_queue.lock().push_back(Arc::clone(&waiter));

        // The condition may have changed before we were queued.
        if ready() {
            self.cancel(&waiter);
            return Ok(());
        }

        log::trace!("{}: blocking", block_desc);
        loop {
            match deadline {
                Some(deadline) => {
                    parker.park_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => parker.park(),
            }
            if waiter.is_fired() {
                break Ok(());
            }
            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                // A notification racing with the timeout wins.
                break if self.cancel(&waiter) {
                    Err(Error::ETIME)
                } else {
                    Ok(())
                };
            }
        }
    }

    /// Wake up at most `num` waiters, or all of them if `num` is 0.
    pub fn notify(&self, num: usize) -> usize {
        let num = if num == 0 { usize::MAX } else { num };

        let mut cnt = 0;
        while cnt < num {
            let waiter = match self.wait_queue.lock().pop_front() {
                Some(waiter) => waiter,
                None => break,
            };
            if waiter.fire() {
                waiter.unparker.unpark();
                cnt += 1;
            }
        }
        cnt
    }
}

impl Default for WaitObject {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
