#![no_std]

pub const PAGE_SHIFT: usize = 12;

pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

pub const PAGE_MASK: usize = PAGE_SIZE - 1;

pub const USER_BASE: usize = 0x100000;

pub const USER_END: usize = 0x7FFF_0000_0000;

#[inline]
pub const fn page_align_up(val: usize) -> Option<usize> {
    match val.checked_add(PAGE_MASK) {
        Some(val) => Some(val & !PAGE_MASK),
        None => None,
    }
}

#[inline]
pub const fn is_page_aligned(val: usize) -> bool {
    val & PAGE_MASK == 0
}
