//! Registered memory regions.
//!
//! A region is treated as a byte arena: blocks inside it are addressed by
//! offset, and offsets are turned back into pointers only when a payload is
//! handed out.

use core::ptr::NonNull;

use crate::block::{BlockHeader, HEADER_SIZE};

/// Maximum number of regions a [`Heap`](crate::Heap) can hold.
pub const MAX_REGIONS: usize = 16;

/// A contiguous memory extent supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Region {
    start: NonNull<u8>,
    len: usize,
}

impl Region {
    pub(crate) fn new(start: NonNull<u8>, len: usize) -> Self {
        Self { start, len }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn start_addr(&self) -> usize {
        self.start.as_ptr().addr()
    }

    pub(crate) fn end_addr(&self) -> usize {
        self.start_addr() + self.len
    }

    pub(crate) fn overlaps(&self, start: usize, len: usize) -> bool {
        start < self.end_addr() && self.start_addr() < start + len
    }

    /// Returns the header offset of the block whose payload starts at
    /// `addr`, or `None` if `addr` cannot be a payload address of this
    /// region.
    pub(crate) fn header_offset_of(&self, addr: usize) -> Option<usize> {
        let offset = addr.checked_sub(self.start_addr())?;
        if offset < HEADER_SIZE || offset > self.len {
            return None;
        }
        Some(offset - HEADER_SIZE)
    }

    /// Returns a pointer `offset` bytes into the region.
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= self.len);
        // SAFETY: `offset` stays within the registered extent.
        unsafe { self.start.add(offset) }
    }

    /// Reads the block header stored at `offset`.
    ///
    /// # Safety
    ///
    /// A header must have been written at `offset` by [`Self::write_header`].
    pub(crate) unsafe fn read_header(&self, offset: usize) -> BlockHeader {
        debug_assert!(offset + HEADER_SIZE <= self.len);
        unsafe { self.ptr_at(offset).cast::<BlockHeader>().read_unaligned() }
    }

    /// Writes a block header at `offset`.
    ///
    /// # Safety
    ///
    /// `offset..offset + HEADER_SIZE` must lie inside the region and must not
    /// overlap a payload that is still in use.
    pub(crate) unsafe fn write_header(&self, offset: usize, header: BlockHeader) {
        debug_assert!(offset + HEADER_SIZE <= self.len);
        unsafe {
            self.ptr_at(offset)
                .cast::<BlockHeader>()
                .write_unaligned(header);
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec;

    use super::*;

    fn with_region<F>(len: usize, test_fn: F)
    where
        F: FnOnce(Region, usize),
    {
        let mut buffer = vec![0x11_u8; len];
        let start = NonNull::new(buffer.as_mut_ptr()).unwrap();
        test_fn(Region::new(start, len), start.as_ptr().addr());
    }

    #[test]
    fn test_header_offset_of() {
        with_region(256, |region, base| {
            assert_eq!(region.header_offset_of(base + HEADER_SIZE), Some(0));
            assert_eq!(region.header_offset_of(base + HEADER_SIZE + 7), Some(7));
            assert_eq!(region.header_offset_of(base + 256), Some(256 - HEADER_SIZE));
            assert_eq!(region.header_offset_of(base), None);
            assert_eq!(region.header_offset_of(base + 257), None);
            assert_eq!(region.header_offset_of(base.wrapping_sub(1)), None);
        });
    }

    #[test]
    fn test_unaligned_header_round_trip() {
        with_region(256, |region, _base| unsafe {
            let header = BlockHeader::free(42, None);
            region.write_header(3, header);
            assert_eq!(region.read_header(3), header);
        });
    }

    #[test]
    fn test_overlaps() {
        with_region(64, |region, base| {
            assert!(region.overlaps(base, 1));
            assert!(region.overlaps(base - 8, 9));
            assert!(region.overlaps(base + 63, 100));
            assert!(!region.overlaps(base + 64, 100));
            assert!(!region.overlaps(base - 8, 8));
        });
    }
}
