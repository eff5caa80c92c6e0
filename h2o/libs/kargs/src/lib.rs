//! Boot arguments of the port IPC kernel.
//!
//! The command line is a whitespace-separated list of `key=value` tokens:
//!
//! * `log=<off|error|warn|info|debug|trace>` - maximum log level;
//! * `queue=<n>` - maximum number of pending messages per port;
//! * `msg=<n>` - maximum data size of a single message, capped at
//!   [`MAX_DATA_SIZE`].
//!
//! Unknown keys are skipped so that arguments meant for other components can
//! share the same command line.

#![cfg_attr(not(test), no_std)]

use core::str::FromStr;

use log::LevelFilter;
use lpc_call::{ipc::MAX_DATA_SIZE, Error, Result};

pub const DEFAULT_QUEUE_SIZE: usize = 2048;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KernelArgs {
    pub log_level: LevelFilter,
    pub max_queue_size: usize,
    pub max_data_size: usize,
}

impl Default for KernelArgs {
    fn default() -> Self {
        KernelArgs {
            log_level: LevelFilter::Info,
            max_queue_size: DEFAULT_QUEUE_SIZE,
            max_data_size: MAX_DATA_SIZE,
        }
    }
}

impl KernelArgs {
    pub fn parse(cmdline: &str) -> Result<Self> {
        let mut args = KernelArgs::default();
        for token in cmdline.split_whitespace() {
            let (key, value) = token.split_once('=').ok_or(Error::EINVAL)?;
            match key {
                "log" => args.log_level = LevelFilter::from_str(value).map_err(|_| Error::EINVAL)?,
                "queue" => args.max_queue_size = parse_nonzero(value)?,
                "msg" => args.max_data_size = parse_nonzero(value)?.min(MAX_DATA_SIZE),
                _ => {}
            }
        }
        Ok(args)
    }
}

impl FromStr for KernelArgs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_nonzero(value: &str) -> Result<usize> {
    match usize::from_str(value) {
        Ok(0) | Err(_) => Err(Error::EINVAL),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cmdline_is_default() {
        assert_eq!(KernelArgs::parse("").unwrap(), KernelArgs::default());
        assert_eq!(KernelArgs::parse("   ").unwrap(), KernelArgs::default());
    }

    #[test]
    fn parse_all_keys() {
        let args: KernelArgs = "log=trace queue=16 msg=64".parse().unwrap();
        assert_eq!(args.log_level, LevelFilter::Trace);
        assert_eq!(args.max_queue_size, 16);
        assert_eq!(args.max_data_size, 64);
    }

    #[test]
    fn message_size_is_capped() {
        let args = KernelArgs::parse("msg=100000").unwrap();
        assert_eq!(args.max_data_size, MAX_DATA_SIZE);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let args = KernelArgs::parse("console=ttyS0 queue=4").unwrap();
        assert_eq!(args.max_queue_size, 4);
    }

    #[test]
    fn malformed_values() {
        assert_eq!(KernelArgs::parse("queue=0"), Err(Error::EINVAL));
        assert_eq!(KernelArgs::parse("queue=abc"), Err(Error::EINVAL));
        assert_eq!(KernelArgs::parse("log=loud"), Err(Error::EINVAL));
        assert_eq!(KernelArgs::parse("verbose"), Err(Error::EINVAL));
    }
}
