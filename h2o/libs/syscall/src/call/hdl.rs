use core::fmt;

use crate::{Error, Result, SerdeReg};

/// A task-local name for a kernel object.
///
/// Handle values only mean something inside the task that owns them, and 0
/// is never a valid handle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(u32);

impl Handle {
    pub const NULL: Handle = Handle(0);

    #[inline]
    pub const fn new(raw: u32) -> Handle {
        Handle(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// # Errors
    ///
    /// Returns `EINVAL` for [`Handle::NULL`].
    #[inline]
    pub fn check_null(self) -> Result<Self> {
        if self.is_null() {
            Err(Error::EINVAL)
        } else {
            Ok(self)
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

impl SerdeReg for Handle {
    #[inline]
    fn encode(self) -> usize {
        self.0.encode()
    }

    #[inline]
    fn decode(val: usize) -> Self {
        Handle(SerdeReg::decode(val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle() {
        assert!(Handle::NULL.is_null());
        assert_eq!(Handle::NULL.check_null(), Err(Error::EINVAL));
        assert_eq!(Handle::new(3).check_null(), Ok(Handle::new(3)));
        assert_eq!(Handle::decode(Handle::new(3).encode()).raw(), 3);
    }
}
