//! Register transport for syscall arguments and return values.

/// A value that travels in one general-purpose register.
///
/// Decoding never fails: extra bits are truncated and the callee validates
/// the result itself (handles are looked up, user pointers are checked).
pub trait SerdeReg: Sized {
    fn encode(self) -> usize;
    fn decode(val: usize) -> Self;
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl SerdeReg for $ty {
            #[inline]
            fn encode(self) -> usize {
                self as usize
            }

            #[inline]
            fn decode(val: usize) -> Self {
                val as $ty
            }
        }
    )*};
}

impl_unsigned!(u16, u32, usize);
#[cfg(target_pointer_width = "64")]
impl_unsigned!(u64);

impl<T> SerdeReg for *const T {
    #[inline]
    fn encode(self) -> usize {
        self as usize
    }

    #[inline]
    fn decode(val: usize) -> Self {
        val as *const T
    }
}

impl<T> SerdeReg for *mut T {
    #[inline]
    fn encode(self) -> usize {
        self as usize
    }

    #[inline]
    fn decode(val: usize) -> Self {
        val as *mut T
    }
}
