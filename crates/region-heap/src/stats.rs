//! Free-space statistics.

use crate::heap::Heap;

/// Free-space summary returned by [`Heap::stats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Sum of the payload sizes of all free blocks.
    pub total_free: usize,
    /// Payload size of the largest free block, or 0 if there is none.
    pub largest_free: usize,
}

impl Heap {
    /// Walks the whole chain and summarizes the free blocks.
    ///
    /// Free blocks that are adjacent but not yet coalesced are counted
    /// separately, so `largest_free` may underestimate what an allocation
    /// can obtain after the coalescing pass.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        self.blocks()
            .filter(|block| block.state.is_free())
            .fold(HeapStats::default(), |stats, block| HeapStats {
                total_free: stats.total_free + block.size,
                largest_free: stats.largest_free.max(block.size),
            })
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HEADER_SIZE, heap::tests::with_test_heap};

    #[test]
    fn test_stats_of_empty_heap() {
        assert_eq!(Heap::new().stats(), HeapStats::default());
    }

    #[test]
    fn test_stats_of_fresh_region() {
        with_test_heap(4000, |heap, _start| {
            let stats = heap.stats();
            assert_eq!(stats.total_free, 4000 - HEADER_SIZE);
            assert_eq!(stats.largest_free, 4000 - HEADER_SIZE);
        });
    }

    #[test]
    fn test_stats_sum_and_max() {
        with_test_heap(1024, |heap, _start| unsafe {
            let a = heap.allocate(100).unwrap();
            let _b = heap.allocate(16).unwrap();
            heap.release(a.as_ptr());

            let rest = 1024 - 3 * HEADER_SIZE - 100 - 16;
            let stats = heap.stats();
            assert_eq!(stats.total_free, 100 + rest);
            assert_eq!(stats.largest_free, rest.max(100));
        });
    }

    #[test]
    fn test_stats_when_full() {
        with_test_heap(256, |heap, _start| {
            heap.allocate(256 - 2 * HEADER_SIZE).unwrap();
            assert_eq!(heap.stats(), HeapStats::default());
        });
    }
}
