//! Region registration.

use core::ptr::NonNull;

use log::{debug, trace, warn};
use snafu::{OptionExt as _, ensure};

use crate::{
    block::{BlockHeader, BlockId, HEADER_SIZE},
    error::{HeapError, NullRegionSnafu, RegionTableFullSnafu, RegionTooSmallSnafu},
    heap::Heap,
    region::{MAX_REGIONS, Region},
};

impl Heap {
    /// Adds a memory region to the heap.
    ///
    /// The region becomes one free block appended at the tail of the chain.
    /// It is never merged with previously registered regions, even if they
    /// are adjacent in memory.
    ///
    /// A null `start`, a `len` smaller than [`HEADER_SIZE`], or a full region
    /// table makes this a no-op. Use [`try_add_region`](Self::try_add_region)
    /// to find out why a region was rejected.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// - The range `start..start + len` is valid for reads and writes
    /// - The memory is not used by anything else while the heap is alive
    /// - The range does not overlap a region already registered
    pub unsafe fn add_region(&mut self, start: *mut u8, len: usize) {
        if let Err(err) = unsafe { self.try_add_region(start, len) } {
            match err {
                HeapError::RegionTableFull { .. } => warn!("region {start:p} ignored: {err}"),
                _ => debug!("region {start:p} ignored: {err}"),
            }
        }
    }

    /// Adds a memory region to the heap, reporting why it was rejected.
    ///
    /// # Safety
    ///
    /// Same requirements as [`add_region`](Self::add_region).
    pub unsafe fn try_add_region(&mut self, start: *mut u8, len: usize) -> Result<(), HeapError> {
        let start = NonNull::new(start).context(NullRegionSnafu)?;
        ensure!(len >= HEADER_SIZE, RegionTooSmallSnafu { len });
        ensure!(
            !self.regions.is_full(),
            RegionTableFullSnafu {
                capacity: MAX_REGIONS
            }
        );

        let region = Region::new(start, len);
        debug_assert!(
            !self
                .regions
                .iter()
                .any(|r| r.overlaps(region.start_addr(), len)),
            "region overlaps a registered region"
        );

        let tail = self.last_block();
        let id = BlockId {
            region: self.regions.len(),
            offset: 0,
        };
        self.regions.push(region);
        self.set_header(id, BlockHeader::free(len - HEADER_SIZE, None));

        if let Some(last) = tail {
            let mut header = self.header(last);
            header.next = Some(id);
            self.set_header(last, header);
        } else {
            self.head = Some(id);
            self.free_hint = Some(id);
        }

        trace!(
            "region #{} registered: {start:p}, {len} bytes",
            id.region
        );
        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::{vec, vec::Vec};
    use core::ptr;

    use super::*;
    use crate::{BlockState, heap::tests::assert_consistent};

    #[test]
    fn test_register_single_region() {
        let mut buffer = vec![0_u8; 256];
        let mut heap = Heap::new();
        unsafe {
            heap.try_add_region(buffer.as_mut_ptr(), 256).unwrap();
        }

        let blocks = heap.blocks().collect::<Vec<_>>();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].addr, buffer.as_ptr().addr());
        assert_eq!(blocks[0].size, 256 - HEADER_SIZE);
        assert_eq!(blocks[0].state, BlockState::Free);
        assert_eq!(heap.free_hint(), Some(blocks[0]));
        assert_consistent(&heap);
    }

    #[test]
    fn test_regions_appended_at_tail() {
        let mut first = vec![0_u8; 128];
        let mut second = vec![0_u8; 256];
        let mut heap = Heap::new();
        unsafe {
            heap.add_region(first.as_mut_ptr(), 128);
            heap.add_region(second.as_mut_ptr(), 256);
        }

        let blocks = heap.blocks().collect::<Vec<_>>();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].addr, first.as_ptr().addr());
        assert_eq!(blocks[1].addr, second.as_ptr().addr());
        assert_eq!(heap.region_bytes(), 384);
        // the hint stays on the first region
        assert_eq!(heap.free_hint(), Some(blocks[0]));
    }

    #[test]
    fn test_adjacent_regions_not_merged() {
        let mut buffer = vec![0_u8; 512];
        let mut heap = Heap::new();
        unsafe {
            heap.add_region(buffer.as_mut_ptr(), 256);
            heap.add_region(buffer.as_mut_ptr().add(256), 256);
        }

        let blocks = heap.blocks().collect::<Vec<_>>();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].end_addr(), blocks[1].addr);
        assert_eq!(heap.stats().largest_free, 256 - HEADER_SIZE);
    }

    #[test]
    fn test_reject_null_region() {
        let mut heap = Heap::new();
        let err = unsafe { heap.try_add_region(ptr::null_mut(), 256) }.unwrap_err();
        assert!(matches!(err, HeapError::NullRegion { .. }));
        unsafe {
            heap.add_region(ptr::null_mut(), 256);
        }
        assert_eq!(heap.region_count(), 0);
    }

    #[test]
    fn test_reject_region_smaller_than_header() {
        let mut buffer = vec![0_u8; HEADER_SIZE];
        let mut heap = Heap::new();
        let err = unsafe { heap.try_add_region(buffer.as_mut_ptr(), HEADER_SIZE - 1) }.unwrap_err();
        assert!(matches!(err, HeapError::RegionTooSmall { len, .. } if len == HEADER_SIZE - 1));
        assert!(heap.free_hint().is_none());

        // exactly one header is accepted, leaving an empty free block
        unsafe {
            heap.try_add_region(buffer.as_mut_ptr(), HEADER_SIZE).unwrap();
        }
        assert_eq!(heap.blocks().next().unwrap().size, 0);
        assert!(heap.allocate(0).is_none());
    }

    #[test]
    fn test_reject_when_table_full() {
        let mut buffer = vec![0_u8; 64 * (MAX_REGIONS + 1)];
        let start = buffer.as_mut_ptr();
        let mut heap = Heap::new();
        for i in 0..MAX_REGIONS {
            unsafe {
                heap.try_add_region(start.add(64 * i), 64).unwrap();
            }
        }
        let err = unsafe { heap.try_add_region(start.add(64 * MAX_REGIONS), 64) }.unwrap_err();
        assert!(matches!(err, HeapError::RegionTableFull { capacity, .. } if capacity == MAX_REGIONS));
        assert_eq!(heap.region_count(), MAX_REGIONS);
        assert_consistent(&heap);
    }
}
