//! Listening for connection requests on a connection port.
//!
//! A server thread waits on its connection port with [`listen`], which keeps
//! receiving until a connection request shows up. Every other message that
//! arrives meanwhile is consumed and dropped. The kind of each received
//! message is read back from the caller's buffer, which lives in the caller's
//! address space and may be unmapped at any moment; that read goes through
//! [`guard`], so a bad buffer becomes `EFAULT` rather than a kernel fault.

use lpc_call::{
    ipc::{self, PortMessage},
    Error, Handle, Result,
};

use crate::{
    mem::Space,
    syscall::{Out, UserPtr},
};

/// The blocking receive primitive the listener is built on.
pub trait Receive {
    /// Block until the next message for `hdl` has been written to `msg`.
    ///
    /// # Errors
    ///
    /// Any error is terminal for the listener and returned to its caller
    /// unchanged.
    fn receive(&self, hdl: Handle, msg: UserPtr<Out, PortMessage>) -> Result;
}

impl<R: Receive + ?Sized> Receive for &R {
    #[inline]
    fn receive(&self, hdl: Handle, msg: UserPtr<Out, PortMessage>) -> Result {
        (**self).receive(hdl, msg)
    }
}

/// What the listener does with a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A connection request, privileged or not. Ends the listen.
    Connection,
    /// Any other message. Carries the raw kind for tracing.
    Discard(u16),
}

/// Classify a raw `kind` with the `KERNEL_MODE` annotation masked off.
#[inline]
pub fn classify(kind: u16) -> Verdict {
    if ipc::is_connection_request(kind) {
        Verdict::Connection
    } else {
        Verdict::Discard(kind)
    }
}

/// Read the kind of the message in `msg` and classify it.
///
/// # Errors
///
/// Returns `EFAULT` if the kind cannot be read from the caller's buffer.
pub fn guard(space: &Space, msg: UserPtr<Out, PortMessage>) -> Result<Verdict> {
    let kind = msg.read_back().byte_offset::<u16>(ipc::KIND_OFFSET);
    match unsafe { kind.read(space) } {
        Ok(kind) => Ok(classify(kind)),
        Err(err) => {
            log::debug!("listen: buffer at {:#x} unreadable: {:?}", msg.addr(), err);
            Err(Error::EFAULT)
        }
    }
}

/// Receive messages from `chan` into `msg` until one of them is a connection
/// request.
///
/// On success `msg` holds the connection request. The loop has no timeout of
/// its own; it ends only when the channel delivers a connection request or
/// fails.
///
/// # Errors
///
/// Returns the channel's error as is, or `EFAULT` if the received message
/// cannot be read back from `msg`.
pub fn listen<R>(chan: &R, space: &Space, hdl: Handle, msg: UserPtr<Out, PortMessage>) -> Result
where
    R: Receive + ?Sized,
{
    loop {
        chan.receive(hdl, msg)?;
        match guard(space, msg)? {
            Verdict::Connection => break Ok(()),
            Verdict::Discard(kind) => {
                log::trace!("listen: dropping message of kind {:#x} on {:?}", kind, hdl)
            }
        }
    }
}
