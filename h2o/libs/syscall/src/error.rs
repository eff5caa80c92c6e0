pub mod c_ty;

use core::{fmt, ops::Range};

pub use self::c_ty::*;

pub const ERRC_RANGE: Range<i32> = 1..35;
pub const CUSTOM_RANGE: Range<i32> = 1001..1004;

pub type Result<T = ()> = core::result::Result<T, Error>;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Error(i32);

impl Error {
    pub const OK: Error = Error(0);

    /// Operation not permitted
    pub const EPERM: Error = Error(1);
    /// No such file or directory
    pub const ENOENT: Error = Error(2);
    /// No such process
    pub const ESRCH: Error = Error(3);
    /// Interrupted system call
    pub const EINTR: Error = Error(4);
    /// I/O error
    pub const EIO: Error = Error(5);
    /// No such device or address
    pub const ENXIO: Error = Error(6);
    /// Argument list too long
    pub const E2BIG: Error = Error(7);
    /// Exec format error
    pub const ENOEXEC: Error = Error(8);
    /// Bad file number
    pub const EBADF: Error = Error(9);
    /// No child processes
    pub const ECHILD: Error = Error(10);
    /// Try again
    pub const EAGAIN: Error = Error(11);
    /// Out of memory
    pub const ENOMEM: Error = Error(12);
    /// Permission denied
    pub const EACCES: Error = Error(13);
    /// Bad address
    pub const EFAULT: Error = Error(14);
    /// Block device required
    pub const ENOTBLK: Error = Error(15);
    /// Device or resource busy
    pub const EBUSY: Error = Error(16);
    /// File exists
    pub const EEXIST: Error = Error(17);
    /// Cross-device link
    pub const EXDEV: Error = Error(18);
    /// No such device
    pub const ENODEV: Error = Error(19);
    /// Not a directory
    pub const ENOTDIR: Error = Error(20);
    /// Is a directory
    pub const EISDIR: Error = Error(21);
    /// Invalid argument
    pub const EINVAL: Error = Error(22);
    /// File table overflow
    pub const ENFILE: Error = Error(23);
    /// Too many open files
    pub const EMFILE: Error = Error(24);
    /// Not a typewriter
    pub const ENOTTY: Error = Error(25);
    /// Text file busy
    pub const ETXTBSY: Error = Error(26);
    /// File too large
    pub const EFBIG: Error = Error(27);
    /// No space left on device
    pub const ENOSPC: Error = Error(28);
    /// Illegal seek
    pub const ESPIPE: Error = Error(29);
    /// Read-only file system
    pub const EROFS: Error = Error(30);
    /// Too many links
    pub const EMLINK: Error = Error(31);
    /// Broken pipe
    pub const EPIPE: Error = Error(32);
    /// Math argument out of domain of func
    pub const EDOM: Error = Error(33);
    /// Math result not representable
    pub const ERANGE: Error = Error(34);

    /// The object was killed
    pub const EKILLED: Error = Error(1001);
    /// Buffer too small
    pub const EBUFFER: Error = Error(1002);
    /// Timed out
    pub const ETIME: Error = Error(1003);

    #[inline]
    pub const fn raw(&self) -> i32 {
        self.0
    }

    pub fn encode(res: Result<usize>) -> usize {
        match res {
            Ok(val) => val,
            Err(err) => (-(err.0 as isize)) as usize,
        }
    }

    pub fn decode(val: usize) -> Result<usize> {
        match Self::try_decode(val) {
            Some(err) => Err(err),
            None => Ok(val),
        }
    }

    pub fn try_decode(val: usize) -> Option<Error> {
        let errc = (val as isize).checked_neg()?;
        let errc = i32::try_from(errc).ok()?;
        (ERRC_RANGE.contains(&errc) || CUSTOM_RANGE.contains(&errc)).then_some(Error(errc))
    }

    pub fn desc(&self) -> &'static str {
        if self.0 >= 0 && self.0 < ERRC_RANGE.end {
            ERRC_DESC[self.0 as usize]
        } else if CUSTOM_RANGE.contains(&self.0) {
            CUSTOM_DESC[(self.0 - CUSTOM_RANGE.start) as usize]
        } else {
            "Unknown error"
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error({}): {}", self.0, self.desc())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.desc())
    }
}

const ERRC_DESC: [&str; ERRC_RANGE.end as usize] = [
    "OK",
    "Operation not permitted",
    "No such file or directory",
    "No such process",
    "Interrupted system call",
    "I/O error",
    "No such device or address",
    "Argument list too long",
    "Exec format error",
    "Bad file number",
    "No child processes",
    "Try again",
    "Out of memory",
    "Permission denied",
    "Bad address",
    "Block device required",
    "Device or resource busy",
    "File exists",
    "Cross-device link",
    "No such device",
    "Not a directory",
    "Is a directory",
    "Invalid argument",
    "File table overflow",
    "Too many open files",
    "Not a typewriter",
    "Text file busy",
    "File too large",
    "No space left on device",
    "Illegal seek",
    "Read-only file system",
    "Too many links",
    "Broken pipe",
    "Math argument out of domain of func",
    "Math result not representable",
];

const CUSTOM_DESC: [&str; 3] = ["The object was killed", "Buffer too small", "Timed out"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_roundtrip() {
        assert_eq!(Error::decode(Error::encode(Ok(42))), Ok(42));
        assert_eq!(
            Error::decode(Error::encode(Err(Error::EPIPE))),
            Err(Error::EPIPE)
        );
        assert_eq!(
            Error::decode(Error::encode(Err(Error::ETIME))),
            Err(Error::ETIME)
        );
    }

    #[test]
    fn large_values_are_not_errors() {
        assert_eq!(Error::try_decode(usize::MAX - 2000), None);
        assert_eq!(Error::try_decode(0), None);
        assert_eq!(Error::try_decode((-1000isize) as usize), None);
    }

    #[test]
    fn descriptions() {
        assert_eq!(Error::OK.desc(), "OK");
        assert_eq!(Error::EFAULT.desc(), "Bad address");
        assert_eq!(Error::EBUFFER.desc(), "Buffer too small");
        assert_eq!(Error(-7).desc(), "Unknown error");
    }
}
