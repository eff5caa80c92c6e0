//! Register-level ABI shared by the port IPC kernel and its callers: status
//! codes, handles, syscall numbers and the port message layout.

#![cfg_attr(not(test), no_std)]
#![warn(clippy::missing_panics_doc)]

pub mod call;
mod error;
mod feat;
pub mod ipc;

pub use self::{
    call::{hdl::Handle, reg::*, Syscall},
    error::*,
    feat::*,
};
