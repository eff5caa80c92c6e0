//! # Port IPC kernel
//!
//! Tasks own connection ports; server threads block on them with
//! [`sched::ipc::listen`] until a client's connection request arrives, while
//! the rest of the port traffic is received and dropped. User memory is only
//! touched through [`syscall::UserPtr`], so a caller's bad buffer surfaces as
//! `EFAULT`.

extern crate alloc;

pub mod log;
pub mod mem;
pub mod sched;
pub mod syscall;

use kargs::KernelArgs;
use lpc_call::Result;

/// Bring up the kernel services configured by `args`.
///
/// # Errors
///
/// Returns `EEXIST` if the kernel logger is already installed.
pub fn init(args: &KernelArgs) -> Result {
    self::log::init(args.log_level)?;
    ::log::info!(
        "Port IPC: queue limit {}, message limit {} bytes",
        args.max_queue_size,
        args.max_data_size
    );
    Ok(())
}
