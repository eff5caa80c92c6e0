use std::time::Instant;

use crossbeam_queue::SegQueue;
use lpc_call::Result;

use super::WaitObject;

/// A lock-free FIFO whose consumers can block until an element arrives.
#[derive(Debug)]
pub struct WaitQueue<T> {
    data: SegQueue<T>,
    wo: WaitObject,
}

impl<T> WaitQueue<T> {
    pub fn new() -> Self {
        WaitQueue {
            data: SegQueue::new(),
            wo: WaitObject::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn try_pop(&self) -> Option<T> {
        self.data.pop()
    }

    pub fn push(&self, data: T) {
        self.data.push(data);
        self.wo.notify(1);
    }

    /// Block until the queue is non-empty, `cond` holds, the deadline passes
    /// or [`WaitQueue::notify_all`] is called. The caller re-checks the
    /// queue afterwards: another consumer may have taken the element.
    ///
    /// # Errors
    ///
    /// Returns `ETIME` if the deadline passed.
    pub fn wait<F>(&self, deadline: Option<Instant>, cond: F, block_desc: &'static str) -> Result
    where
        F: FnOnce() -> bool,
    {
        self.wo
            .wait(deadline, || !self.data.is_empty() || cond(), block_desc)
    }

    pub fn notify_all(&self) -> usize {
        self.wo.notify(0)
    }
}

impl<T> Default for WaitQueue<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
