pub(crate) mod hdl;
pub(crate) mod reg;

/// Creates a connection port. `() -> StatusOrHandle`
pub const SV_PORT_NEW: usize = 0;
/// Closes a port handle. `(hdl) -> Status`
pub const SV_PORT_CLOSE: usize = 1;
/// Posts a connection request. `(hdl, *const PortMessage) -> Status`
pub const SV_PORT_CONNECT: usize = 2;
/// Posts an ordinary message. `(hdl, *const PortMessage) -> Status`
pub const SV_PORT_SEND: usize = 3;
/// Receives the next message. `(hdl, *mut PortMessage, timeout_us) -> Status`
pub const SV_PORT_RECEIVE: usize = 4;
/// Waits for a connection request. `(hdl, *mut PortMessage) -> Status`
pub const SV_PORT_LISTEN: usize = 5;

pub const SYSCALL_COUNT: usize = 6;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Syscall {
    pub num: usize,
    pub args: [usize; 5],
    pub result: usize,
}

impl Syscall {
    pub fn new(num: usize, args: &[usize]) -> Self {
        let mut syscall = Syscall {
            num,
            ..Default::default()
        };
        let len = args.len().min(syscall.args.len());
        syscall.args[..len].copy_from_slice(&args[..len]);
        syscall
    }
}
