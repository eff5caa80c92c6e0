//! # Address space of a task.
//!
//! A [`Space`] is the set of regions a task has mapped into its user address
//! range. The kernel never dereferences user addresses directly: every access
//! goes through [`Space::checked_copy_in`] or [`Space::checked_copy_out`],
//! which stop at the first byte that is not mapped with the required access
//! and report it as a page fault instead of trapping.

use alloc::{boxed::Box, collections::BTreeMap, vec};
use core::sync::atomic::{AtomicUsize, Ordering::SeqCst};

use lpc_call::{Error, Result};
use spin::RwLock;

bitflags::bitflags! {
    /// Flags to describe a block of memory.
    pub struct Flags: u32 {
        const READABLE = 1;
        const WRITABLE = 1 << 1;
    }
}

bitflags::bitflags! {
    /// The error code pushed by a page fault, in the x86 layout.
    pub struct PageFaultErrCode: u64 {
        const PRESENT = 1;
        const WRITE = 1 << 1;
        const USER = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CheckedCopyRet {
    pub errc: PageFaultErrCode,
    /// The faulting address plus one, or zero if no fault occurred.
    pub addr_p1: u64,
}

impl CheckedCopyRet {
    const OK: CheckedCopyRet = CheckedCopyRet {
        errc: PageFaultErrCode::empty(),
        addr_p1: 0,
    };

    fn fault(addr: usize, errc: PageFaultErrCode) -> Self {
        CheckedCopyRet {
            errc: errc | PageFaultErrCode::USER,
            addr_p1: (addr as u64).wrapping_add(1),
        }
    }

    #[inline]
    pub fn is_fault(&self) -> bool {
        self.errc != PageFaultErrCode::empty() || self.addr_p1 != 0
    }

    #[inline]
    pub fn fault_addr(&self) -> Option<usize> {
        self.is_fault()
            .then(|| self.addr_p1.wrapping_sub(1) as usize)
    }
}

#[derive(Debug)]
struct Region {
    flags: Flags,
    data: Box<[u8]>,
}

/// The structure that represents a user address space.
#[derive(Debug)]
pub struct Space {
    regions: RwLock<BTreeMap<usize, Region>>,
    next_base: AtomicUsize,
}

impl Space {
    pub fn new() -> Self {
        Space {
            regions: RwLock::new(BTreeMap::new()),
            next_base: AtomicUsize::new(minfo::USER_BASE),
        }
    }

    /// Map a zeroed region at `base`, rounding `len` up to whole pages.
    ///
    /// # Errors
    ///
    /// Returns `EINVAL` if the range is misaligned, empty or outside the user
    /// range, and `EEXIST` if it overlaps an existing region.
    pub fn map(&self, base: usize, len: usize, flags: Flags) -> Result<usize> {
        let len = minfo::page_align_up(len).ok_or(Error::EINVAL)?;
        let end = base.checked_add(len).ok_or(Error::EINVAL)?;
        if len == 0
            || !minfo::is_page_aligned(base)
            || base < minfo::USER_BASE
            || end > minfo::USER_END
        {
            return Err(Error::EINVAL);
        }

        let mut regions = self.regions.write();
        let prev_overlaps = regions
            .range(..base)
            .next_back()
            .map_or(false, |(&b, r)| b + r.data.len() > base);
        let next_overlaps = regions.range(base..end).next().is_some();
        if prev_overlaps || next_overlaps {
            return Err(Error::EEXIST);
        }

        let data = vec![0u8; len].into_boxed_slice();
        regions.insert(base, Region { flags, data });
        log::trace!("Space::map: {:#x}..{:#x} {:?}", base, end, flags);
        Ok(base)
    }

    /// Map a zeroed region at an address chosen by the space.
    pub fn alloc(&self, len: usize, flags: Flags) -> Result<usize> {
        let size = minfo::page_align_up(len.max(1)).ok_or(Error::ENOMEM)?;
        loop {
            // One guard page between allocations keeps overruns from landing
            // in a neighbouring region.
            let base = self.next_base.fetch_add(size + minfo::PAGE_SIZE, SeqCst);
            if base.saturating_add(size) > minfo::USER_END {
                break Err(Error::ENOMEM);
            }
            match self.map(base, size, flags) {
                Err(Error::EEXIST) => continue,
                res => break res,
            }
        }
    }

    /// # Errors
    ///
    /// Returns `ENOENT` if no region starts at `base`.
    pub fn unmap(&self, base: usize) -> Result {
        let region = self.regions.write().remove(&base).ok_or(Error::ENOENT)?;
        log::trace!("Space::unmap: {:#x}..{:#x}", base, base + region.data.len());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ENOENT` if no region starts at `base`.
    pub fn protect(&self, base: usize, flags: Flags) -> Result {
        let mut regions = self.regions.write();
        let region = regions.get_mut(&base).ok_or(Error::ENOENT)?;
        region.flags = flags;
        Ok(())
    }

    /// Copy `out.len()` bytes starting at the user address `src` into `out`.
    ///
    /// On a fault the bytes before the faulting address have already been
    /// copied; the rest of `out` is left untouched.
    pub fn checked_copy_in(&self, src: usize, out: &mut [u8]) -> CheckedCopyRet {
        let regions = self.regions.read();
        let mut done = 0;
        while done < out.len() {
            let addr = match src.checked_add(done) {
                Some(addr) => addr,
                None => return CheckedCopyRet::fault(usize::MAX, PageFaultErrCode::empty()),
            };
            let (base, region) = match locate(&regions, addr) {
                Some(ent) => ent,
                None => return CheckedCopyRet::fault(addr, PageFaultErrCode::empty()),
            };
            if !region.flags.contains(Flags::READABLE) {
                return CheckedCopyRet::fault(addr, PageFaultErrCode::PRESENT);
            }
            let offset = addr - base;
            let n = (region.data.len() - offset).min(out.len() - done);
            out[done..(done + n)].copy_from_slice(&region.data[offset..(offset + n)]);
            done += n;
        }
        CheckedCopyRet::OK
    }

    /// Copy `data` to the user address `dst`.
    ///
    /// On a fault the bytes before the faulting address have already been
    /// written.
    pub fn checked_copy_out(&self, dst: usize, data: &[u8]) -> CheckedCopyRet {
        let mut regions = self.regions.write();
        let mut done = 0;
        while done < data.len() {
            let addr = match dst.checked_add(done) {
                Some(addr) => addr,
                None => {
                    return CheckedCopyRet::fault(usize::MAX, PageFaultErrCode::WRITE);
                }
            };
            let base = match locate(&regions, addr) {
                Some((base, _)) => base,
                None => return CheckedCopyRet::fault(addr, PageFaultErrCode::WRITE),
            };
            let region = match regions.get_mut(&base) {
                Some(region) => region,
                None => return CheckedCopyRet::fault(addr, PageFaultErrCode::WRITE),
            };
            if !region.flags.contains(Flags::WRITABLE) {
                return CheckedCopyRet::fault(
                    addr,
                    PageFaultErrCode::PRESENT | PageFaultErrCode::WRITE,
                );
            }
            let offset = addr - base;
            let n = (region.data.len() - offset).min(data.len() - done);
            region.data[offset..(offset + n)].copy_from_slice(&data[done..(done + n)]);
            done += n;
        }
        CheckedCopyRet::OK
    }
}

impl Default for Space {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

fn locate(regions: &BTreeMap<usize, Region>, addr: usize) -> Option<(usize, &Region)> {
    regions
        .range(..=addr)
        .next_back()
        .filter(|&(&base, region)| addr - base < region.data.len())
        .map(|(&base, region)| (base, region))
}

#[cfg(test)]
mod tests {
    use minfo::{PAGE_SIZE, USER_BASE};

    use super::*;

    const RW: Flags = Flags::from_bits_truncate(Flags::READABLE.bits() | Flags::WRITABLE.bits());

    #[test]
    fn map_rejects_bad_ranges() {
        let space = Space::new();
        assert_eq!(space.map(USER_BASE + 1, PAGE_SIZE, RW), Err(Error::EINVAL));
        assert_eq!(space.map(0, PAGE_SIZE, RW), Err(Error::EINVAL));
        assert_eq!(space.map(minfo::USER_END, PAGE_SIZE, RW), Err(Error::EINVAL));
        assert_eq!(space.map(USER_BASE, 0, RW), Err(Error::EINVAL));

        space.map(USER_BASE, PAGE_SIZE * 2, RW).unwrap();
        assert_eq!(space.map(USER_BASE + PAGE_SIZE, PAGE_SIZE, RW), Err(Error::EEXIST));
        assert_eq!(space.map(USER_BASE, PAGE_SIZE, RW), Err(Error::EEXIST));
        space.map(USER_BASE + PAGE_SIZE * 2, PAGE_SIZE, RW).unwrap();
    }

    #[test]
    fn copy_across_adjacent_regions() {
        let space = Space::new();
        space.map(USER_BASE, PAGE_SIZE, RW).unwrap();
        space.map(USER_BASE + PAGE_SIZE, PAGE_SIZE, RW).unwrap();

        let addr = USER_BASE + PAGE_SIZE - 2;
        assert!(!space.checked_copy_out(addr, &[1, 2, 3, 4]).is_fault());

        let mut buf = [0; 4];
        assert!(!space.checked_copy_in(addr, &mut buf).is_fault());
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn fault_reports_first_bad_address() {
        let space = Space::new();
        space.map(USER_BASE, PAGE_SIZE, RW).unwrap();

        let mut buf = [0; 8];
        let ret = space.checked_copy_in(USER_BASE + PAGE_SIZE - 4, &mut buf);
        assert_eq!(ret.fault_addr(), Some(USER_BASE + PAGE_SIZE));
        assert!(ret.errc.contains(PageFaultErrCode::USER));
        assert!(!ret.errc.contains(PageFaultErrCode::PRESENT));
    }

    #[test]
    fn access_rights_are_enforced() {
        let space = Space::new();
        let base = space.alloc(16, Flags::READABLE).unwrap();
        let ret = space.checked_copy_out(base, &[1]);
        assert_eq!(ret.fault_addr(), Some(base));
        assert!(ret.errc.contains(PageFaultErrCode::PRESENT | PageFaultErrCode::WRITE));

        space.protect(base, Flags::WRITABLE).unwrap();
        assert!(!space.checked_copy_out(base, &[1]).is_fault());
        let ret = space.checked_copy_in(base, &mut [0]);
        assert_eq!(ret.fault_addr(), Some(base));
    }

    #[test]
    fn unmap_makes_region_fault() {
        let space = Space::new();
        let base = space.alloc(PAGE_SIZE, RW).unwrap();
        assert!(!space.checked_copy_in(base, &mut [0; 4]).is_fault());

        space.unmap(base).unwrap();
        assert_eq!(space.unmap(base), Err(Error::ENOENT));
        assert!(space.checked_copy_in(base, &mut [0; 4]).is_fault());
    }

    #[test]
    fn alloc_leaves_guard_pages() {
        let space = Space::new();
        let a = space.alloc(PAGE_SIZE, RW).unwrap();
        let b = space.alloc(PAGE_SIZE, RW).unwrap();
        assert!(b >= a + 2 * PAGE_SIZE);
        assert!(space.checked_copy_in(a + PAGE_SIZE, &mut [0]).is_fault());
    }
}
