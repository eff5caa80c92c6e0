//! # Syscall surface of the port IPC kernel
//!
//! Every call takes up to five register arguments and returns one register.
//! Calls that produce no value return an encoded [`Status`]; `SV_PORT_NEW`
//! returns an encoded [`lpc_call::StatusOrHandle`].
//!
//! | number            | arguments                            |
//! |-------------------|--------------------------------------|
//! | `SV_PORT_NEW`     | -                                    |
//! | `SV_PORT_CLOSE`   | handle                               |
//! | `SV_PORT_CONNECT` | handle, `*const PortMessage`         |
//! | `SV_PORT_SEND`    | handle, `*const PortMessage`         |
//! | `SV_PORT_RECEIVE` | handle, `*mut PortMessage`, timeout  |
//! | `SV_PORT_LISTEN`  | handle, `*mut PortMessage`           |

mod user_ptr;

use lpc_call::{call::SYSCALL_COUNT, Error, SerdeReg, Status, Syscall};

pub use self::user_ptr::*;
use crate::sched::{ipc::port::*, Task};

type SyscallHandler = fn(&Task, [usize; 5]) -> usize;
static SYSCALL_TABLE: [SyscallHandler; SYSCALL_COUNT] = [
    sv_port_new,
    sv_port_close,
    sv_port_connect,
    sv_port_send,
    sv_port_receive,
    sv_port_listen,
];

pub fn handle(task: &Task, syscall: &mut Syscall) {
    let result = match SYSCALL_TABLE.get(syscall.num).copied() {
        Some(handler) => handler(task, syscall.args),
        None => Status::from_res(Err(Error::EINVAL)).encode(),
    };
    log::trace!(
        "Task #{}: syscall {} {:x?} -> {:#x}",
        task.id(),
        syscall.num,
        syscall.args,
        result
    );
    syscall.result = result
}

#[cfg(test)]
mod tests {
    use core::mem;

    use lpc_call::{
        call::*,
        ipc::{PortMessage, MSG_DATAGRAM},
        Handle, StatusOrHandle,
    };

    use super::*;
    use crate::mem::Flags;

    fn call(task: &Task, num: usize, args: &[usize]) -> usize {
        let mut syscall = Syscall::new(num, args);
        handle(task, &mut syscall);
        syscall.result
    }

    #[test]
    fn unknown_syscall() {
        let task = Task::default();
        let ret = Status::decode(call(&task, SYSCALL_COUNT, &[]));
        assert_eq!(ret.into_res(), Err(Error::EINVAL));
    }

    #[test]
    fn register_roundtrip() {
        let task = Task::default();
        let hdl = StatusOrHandle::decode(call(&task, SV_PORT_NEW, &[]))
            .into_res()
            .unwrap();

        let buf = task
            .space()
            .alloc(mem::size_of::<PortMessage>(), Flags::READABLE | Flags::WRITABLE)
            .unwrap();
        let msg = UserPtr::<Out, PortMessage>::from_addr(buf);
        unsafe { msg.write(task.space(), PortMessage::new(MSG_DATAGRAM, b"x")) }.unwrap();

        let args = [hdl.encode(), buf];
        let ret = Status::decode(call(&task, SV_PORT_SEND, &args));
        assert_eq!(ret.into_res(), Ok(()));
        let ret = Status::decode(call(&task, SV_PORT_CONNECT, &args));
        assert_eq!(ret.into_res(), Ok(()));

        let ret = Status::decode(call(&task, SV_PORT_LISTEN, &args));
        assert_eq!(ret.into_res(), Ok(()));
        let got = unsafe { UserPtr::<In, PortMessage>::from_addr(buf).read(task.space()) }.unwrap();
        assert!(got.header.is_connection_request());

        let ret = Status::decode(call(&task, SV_PORT_RECEIVE, &[hdl.encode(), buf, 0]));
        assert_eq!(ret.into_res(), Err(Error::ENOENT));

        let ret = Status::decode(call(&task, SV_PORT_CLOSE, &[hdl.encode()]));
        assert_eq!(ret.into_res(), Ok(()));
        let ret = Status::decode(call(&task, SV_PORT_LISTEN, &args));
        assert_eq!(ret.into_res(), Err(Error::EBADF));

        let ret = Status::decode(call(&task, SV_PORT_LISTEN, &[Handle::NULL.encode(), buf]));
        assert_eq!(ret.into_res(), Err(Error::EINVAL));
    }
}
