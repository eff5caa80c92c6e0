use crate::SerdeReg;

bitflags::bitflags! {
    /// Rights carried by a handle.
    #[repr(transparent)]
    pub struct Feature: u64 {
        /// Messages may be received through the handle. Closing a handle
        /// with this right closes the object behind it.
        const READ = 1 << 2;
        /// Messages may be posted through the handle.
        const WRITE = 1 << 3;
    }
}

impl SerdeReg for Feature {
    fn encode(self) -> usize {
        self.bits() as usize
    }

    fn decode(val: usize) -> Self {
        Feature::from_bits_truncate(val as u64)
    }
}
