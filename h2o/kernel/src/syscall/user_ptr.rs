use core::{marker::PhantomData, mem, mem::MaybeUninit, slice};

use lpc_call::{Error, Result, SerdeReg};
pub use types::*;

use crate::mem::space::{CheckedCopyRet, Space};

/// A pointer into a task's user address space.
///
/// The pointer is never dereferenced directly. Every access is a checked copy
/// through the owning [`Space`], so an unmapped or protected address turns
/// into `EFAULT` instead of a fault in the kernel.
#[derive(Debug, Copy, Clone)]
pub struct UserPtr<T: Type, D> {
    data: *mut D,
    _marker: PhantomData<T>,
}

impl<T: Type, D> UserPtr<T, D> {
    pub fn new(data: *mut D) -> Self {
        UserPtr {
            data,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn from_addr(addr: usize) -> Self {
        Self::new(addr as *mut D)
    }

    #[inline]
    pub fn addr(&self) -> usize {
        self.data as usize
    }

    /// Reinterpret the pointer at `offset` bytes past its address.
    #[inline]
    pub fn byte_offset<E>(&self, offset: usize) -> UserPtr<T, E> {
        UserPtr::from_addr(self.addr().wrapping_add(offset))
    }

    pub fn check(&self) -> Result {
        check_ptr(self.addr(), mem::size_of::<D>(), mem::align_of::<D>())
    }
}

impl<D> UserPtr<In, D> {
    /// # Safety
    ///
    /// Every bit pattern must be a valid `D`.
    pub unsafe fn read(&self, space: &Space) -> Result<D> {
        self.check()?;

        let mut data = MaybeUninit::<D>::zeroed();
        let bytes = slice::from_raw_parts_mut(data.as_mut_ptr().cast::<u8>(), mem::size_of::<D>());
        into_result(space.checked_copy_in(self.addr(), bytes))?;

        Ok(data.assume_init())
    }
}

impl<D> UserPtr<Out, D> {
    /// # Safety
    ///
    /// `D` must not contain padding bytes.
    pub unsafe fn write(&self, space: &Space, value: D) -> Result {
        self.check()?;

        let bytes = slice::from_raw_parts((&value as *const D).cast::<u8>(), mem::size_of::<D>());
        into_result(space.checked_copy_out(self.addr(), bytes))
    }

    /// The same buffer, for reading back what the kernel wrote into it.
    #[inline]
    pub fn read_back(&self) -> UserPtr<In, D> {
        UserPtr::new(self.data)
    }
}

impl<T: Type, D> SerdeReg for UserPtr<T, D> {
    #[inline]
    fn encode(self) -> usize {
        self.data as usize
    }

    #[inline]
    fn decode(val: usize) -> Self {
        UserPtr::from_addr(val)
    }
}

fn check_ptr(addr: usize, size: usize, align: usize) -> Result {
    let is_in_range =
        minfo::USER_BASE <= addr && addr.saturating_add(size) <= minfo::USER_END;
    let is_aligned = addr & (align - 1) == 0;
    if is_in_range && is_aligned {
        Ok(())
    } else {
        Err(Error::EINVAL)
    }
}

fn into_result(ret: CheckedCopyRet) -> Result {
    match ret.fault_addr() {
        Some(addr) => {
            log::warn!(
                "Page fault at {:#x} ({:?}) during user pointer access",
                addr,
                ret.errc
            );
            Err(Error::EFAULT)
        }
        None => Ok(()),
    }
}

mod types {
    #[derive(Debug, Copy, Clone)]
    pub enum In {}
    #[derive(Debug, Copy, Clone)]
    pub enum Out {}

    pub trait Type {}
    impl Type for In {}
    impl Type for Out {}
}
