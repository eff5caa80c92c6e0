pub mod listen;
mod syscall;

use core::{
    sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering::*},
    time::Duration,
};

use bytes::Bytes;
use kargs::KernelArgs;
use lpc_call::{
    ipc::{
        ClientId, KindFlags, MessageHeader, PortMessage, MAX_DATA_SIZE, MSG_CONNECTION_REQUEST,
    },
    Error, Result,
};

pub use self::syscall::*;
use crate::sched::wait::{deadline_after, WaitQueue};

/// A message queued in a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: MessageHeader,
    data: Bytes,
}

impl Message {
    pub fn new(kind: u16, client: ClientId, data: &[u8]) -> Self {
        let mut header = MessageHeader::new(kind, data.len());
        header.client = client;
        Message {
            header,
            data: Bytes::copy_from_slice(data),
        }
    }

    #[inline]
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn to_raw(&self) -> PortMessage {
        let mut raw = PortMessage {
            header: self.header,
            ..Default::default()
        };
        raw.data[..self.data.len()].copy_from_slice(&self.data);
        raw
    }
}

/// A connection port: the queue every message destined for a server lands
/// in, in arrival order.
#[derive(Debug)]
pub struct Port {
    queue: WaitQueue<Message>,
    /// Queued messages plus slots reserved by senders about to push.
    pending: AtomicUsize,
    closed: AtomicBool,
    next_id: AtomicU32,
    max_queue_size: usize,
    max_data_size: usize,
}

impl Port {
    pub fn new(args: &KernelArgs) -> Self {
        Port {
            queue: WaitQueue::new(),
            pending: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            next_id: AtomicU32::new(1),
            max_queue_size: args.max_queue_size,
            max_data_size: args.max_data_size.min(MAX_DATA_SIZE),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Acquire)
    }

    fn post(&self, mut msg: Message) -> Result {
        if self.is_closed() {
            return Err(Error::EPIPE);
        }
        if msg.data.len() > self.max_data_size {
            return Err(Error::E2BIG);
        }
        self.pending
            .fetch_update(AcqRel, Acquire, |n| (n < self.max_queue_size).then(|| n + 1))
            .map_err(|_| Error::ENOSPC)?;
        msg.header.id = self.next_id.fetch_add(1, SeqCst);
        self.queue.push(msg);
        Ok(())
    }

    fn pop(&self) -> Option<Message> {
        let msg = self.queue.try_pop()?;
        self.pending.fetch_sub(1, AcqRel);
        Some(msg)
    }

    /// Queue a message posted by a client.
    ///
    /// # Errors
    ///
    /// Returns `EPIPE` if the port is closed, `E2BIG` if the data is larger
    /// than the configured limit and `ENOSPC` if the queue is full.
    pub fn send(&self, kind: u16, client: ClientId, data: &[u8]) -> Result {
        self.post(Message::new(kind, client, data))
    }

    /// Queue a message on behalf of the kernel. The message carries the
    /// `KERNEL_MODE` annotation.
    pub fn send_kernel(&self, kind: u16, client: ClientId, data: &[u8]) -> Result {
        let kind = kind | KindFlags::KERNEL_MODE.bits();
        self.post(Message::new(kind, client, data))
    }

    /// Queue a connection request from `client`.
    pub fn connect(&self, client: ClientId, data: &[u8]) -> Result {
        self.send(MSG_CONNECTION_REQUEST, client, data)
    }

    /// # Errors
    ///
    /// Returns `ENOENT` if the port is empty, or `EPIPE` if it is also
    /// closed.
    pub fn try_receive(&self) -> Result<Message> {
        match self.pop() {
            Some(msg) => Ok(msg),
            None if self.is_closed() => Err(Error::EPIPE),
            None => Err(Error::ENOENT),
        }
    }

    /// Wait for the next message. [`Duration::MAX`] waits forever.
    ///
    /// Messages still queued when the port is closed are delivered first.
    ///
    /// # Errors
    ///
    /// Returns `ETIME` if the timeout expires and `EPIPE` if the port is
    /// closed and drained.
    pub fn receive(&self, timeout: Duration) -> Result<Message> {
        let deadline = deadline_after(timeout);
        loop {
            if let Some(msg) = self.pop() {
                break Ok(msg);
            }
            if self.is_closed() {
                break Err(Error::EPIPE);
            }
            self.queue
                .wait(deadline, || self.is_closed(), "Port::receive")?;
        }
    }

    /// Refuse further messages and wake every receiver.
    pub fn close(&self) {
        if !self.closed.swap(true, AcqRel) {
            let woken = self.queue.notify_all();
            log::debug!("Port closed, {} pending, {} receivers woken", self.len(), woken);
        }
    }
}

impl Default for Port {
    fn default() -> Self {
        Port::new(&KernelArgs::default())
    }
}
