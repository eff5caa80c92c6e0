use alloc::sync::Arc;
use core::time::Duration;

use lpc_call::{
    ipc::{PortMessage, MAX_DATA_SIZE, MSG_CONNECTION_REQUEST, MSG_REQUEST},
    Error, Feature, Handle, Result, SerdeReg, Status, StatusOrHandle,
};

use super::{
    listen::{listen, Receive},
    Port,
};
use crate::{
    sched::task::Task,
    syscall::{In, Out, UserPtr},
};

fn timeout_of(timeout_us: u64) -> Duration {
    if timeout_us == u64::MAX {
        Duration::MAX
    } else {
        Duration::from_micros(timeout_us)
    }
}

fn read_message(task: &Task, msg: UserPtr<In, PortMessage>) -> Result<PortMessage> {
    let msg = unsafe { msg.read(task.space()) }?;
    if msg.header.data_len as usize > MAX_DATA_SIZE {
        return Err(Error::EINVAL);
    }
    Ok(msg)
}

/// Create a connection port owned by `task`.
pub fn port_new(task: &Task) -> Result<Handle> {
    let port = Arc::new(Port::new(task.args()));
    let hdl = task
        .handles()
        .write()
        .insert(port, Feature::READ | Feature::WRITE)?;
    log::debug!("Task #{}: new port {:?}", task.id(), hdl);
    Ok(hdl)
}

/// Drop `hdl`. Closing the receiving side of a port closes the port itself.
pub fn port_close(task: &Task, hdl: Handle) -> Result {
    let (port, feat) = task.handles().write().remove::<Port>(hdl)?;
    if feat.contains(Feature::READ) {
        port.close();
    }
    Ok(())
}

/// Post a connection request carrying the data of `msg`. The kind in `msg`
/// is ignored.
pub fn port_connect(task: &Task, hdl: Handle, msg: UserPtr<In, PortMessage>) -> Result {
    msg.check()?;
    let port = task.get::<Port>(hdl, Feature::WRITE)?;
    let msg = read_message(task, msg)?;
    port.connect(task.client_id(), msg.data())
}

/// Post an ordinary message. Connection requests must go through
/// [`port_connect`], and the kernel annotation cannot be forged.
pub fn port_send(task: &Task, hdl: Handle, msg: UserPtr<In, PortMessage>) -> Result {
    msg.check()?;
    let port = task.get::<Port>(hdl, Feature::WRITE)?;
    let msg = read_message(task, msg)?;
    if !msg.header.flags().is_empty() {
        return Err(Error::EPERM);
    }
    match msg.header.kind() {
        MSG_CONNECTION_REQUEST => Err(Error::EINVAL),
        kind if (MSG_REQUEST..MSG_CONNECTION_REQUEST).contains(&kind) => {
            port.send(kind, task.client_id(), msg.data())
        }
        _ => Err(Error::EINVAL),
    }
}

/// Wait for the next message on `hdl` and copy it to `msg`. A timeout of
/// `u64::MAX` waits forever and 0 only polls.
///
/// A message that cannot be copied to `msg` is lost and the call fails with
/// `EFAULT`.
pub fn port_receive(
    task: &Task,
    hdl: Handle,
    msg: UserPtr<Out, PortMessage>,
    timeout_us: u64,
) -> Result {
    msg.check()?;
    let port = task.get::<Port>(hdl, Feature::READ)?;

    let received = match timeout_us {
        0 => port.try_receive(),
        _ => port.receive(timeout_of(timeout_us)),
    }?;

    unsafe { msg.write(task.space(), received.to_raw()) }.map_err(|err| {
        log::warn!(
            "Task #{}: message {} on {:?} dropped: {:?}",
            task.id(),
            received.header().id,
            hdl,
            err
        );
        err
    })
}

/// Wait on `hdl` until a connection request is copied to `msg`.
///
/// See [`listen`].
pub fn port_listen(task: &Task, hdl: Handle, msg: UserPtr<Out, PortMessage>) -> Result {
    listen(task, task.space(), hdl, msg)
}

impl Receive for Task {
    #[inline]
    fn receive(&self, hdl: Handle, msg: UserPtr<Out, PortMessage>) -> Result {
        port_receive(self, hdl, msg, u64::MAX)
    }
}

/// Receives on behalf of `task` with a bounded wait, so that a listener
/// built on it gives up with `ETIME`.
#[derive(Debug, Clone, Copy)]
pub struct Timed<'a> {
    pub task: &'a Task,
    pub timeout_us: u64,
}

impl Receive for Timed<'_> {
    #[inline]
    fn receive(&self, hdl: Handle, msg: UserPtr<Out, PortMessage>) -> Result {
        port_receive(self.task, hdl, msg, self.timeout_us)
    }
}

pub(crate) fn sv_port_new(task: &Task, _: [usize; 5]) -> usize {
    StatusOrHandle::from_res(port_new(task)).encode()
}

pub(crate) fn sv_port_close(task: &Task, args: [usize; 5]) -> usize {
    Status::from_res(port_close(task, SerdeReg::decode(args[0]))).encode()
}

pub(crate) fn sv_port_connect(task: &Task, args: [usize; 5]) -> usize {
    let res = port_connect(task, SerdeReg::decode(args[0]), SerdeReg::decode(args[1]));
    Status::from_res(res).encode()
}

pub(crate) fn sv_port_send(task: &Task, args: [usize; 5]) -> usize {
    let res = port_send(task, SerdeReg::decode(args[0]), SerdeReg::decode(args[1]));
    Status::from_res(res).encode()
}

pub(crate) fn sv_port_receive(task: &Task, args: [usize; 5]) -> usize {
    let res = port_receive(
        task,
        SerdeReg::decode(args[0]),
        SerdeReg::decode(args[1]),
        SerdeReg::decode(args[2]),
    );
    Status::from_res(res).encode()
}

pub(crate) fn sv_port_listen(task: &Task, args: [usize; 5]) -> usize {
    let res = port_listen(task, SerdeReg::decode(args[0]), SerdeReg::decode(args[1]));
    Status::from_res(res).encode()
}
