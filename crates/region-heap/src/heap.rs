//! Heap state shared by all allocator operations.

use core::ptr::NonNull;

use arrayvec::ArrayVec;

use crate::{
    block::{BlockHeader, BlockId, BlockInfo, HEADER_SIZE},
    region::{MAX_REGIONS, Region},
};

/// A block allocator over caller-supplied memory regions.
///
/// The heap owns the chain of blocks covering every registered region and a
/// *free hint*, a best-effort pointer to a free block where allocation
/// searches start. The hint never owns a block; it is either `None` or refers
/// to a block currently marked free.
///
/// # Thread Safety
///
/// `Heap` is `Send` but not `Sync`. It can be moved between threads but
/// requires external synchronization for concurrent access.
#[derive(Debug)]
pub struct Heap {
    pub(crate) regions: ArrayVec<Region, MAX_REGIONS>,
    pub(crate) head: Option<BlockId>,
    pub(crate) free_hint: Option<BlockId>,
}

// SAFETY: the heap only refers to memory that the caller handed over
// exclusively through `add_region`.
unsafe impl Send for Heap {}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Creates an empty heap with no regions.
    ///
    /// Use [`add_region`](Self::add_region) to supply memory before
    /// allocating.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: ArrayVec::new_const(),
            head: None,
            free_hint: None,
        }
    }

    /// Resets the heap to the empty state, forgetting every region.
    ///
    /// Pointers handed out before the reset must not be passed back to this
    /// heap afterwards.
    pub fn initialize(&mut self) {
        self.regions.clear();
        self.head = None;
        self.free_hint = None;
    }

    /// Returns the number of registered regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Returns the total number of bytes accepted by region registration.
    ///
    /// The sum of header and payload sizes over all blocks always equals
    /// this value.
    #[must_use]
    pub fn region_bytes(&self) -> usize {
        self.regions.iter().map(Region::len).sum()
    }

    /// Returns an iterator over all blocks in chain order.
    #[must_use]
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            heap: self,
            cursor: self.head,
        }
    }

    /// Returns the block the next allocation search starts from.
    #[must_use]
    pub fn free_hint(&self) -> Option<BlockInfo> {
        self.free_hint.map(|id| self.info(id, &self.header(id)))
    }

    pub(crate) fn header(&self, id: BlockId) -> BlockHeader {
        // SAFETY: every `BlockId` stored in the chain names a written header.
        unsafe { self.regions[id.region].read_header(id.offset) }
    }

    pub(crate) fn set_header(&mut self, id: BlockId, header: BlockHeader) {
        // SAFETY: `id` names a block boundary inside its region.
        unsafe { self.regions[id.region].write_header(id.offset, header) }
    }

    pub(crate) fn payload(&self, id: BlockId) -> NonNull<u8> {
        self.regions[id.region].ptr_at(id.offset + HEADER_SIZE)
    }

    /// Finds the block whose payload starts at `ptr`.
    ///
    /// Only the region bounds are checked; whether a block actually starts
    /// there is the caller's responsibility.
    pub(crate) fn locate(&self, ptr: *const u8) -> Option<BlockId> {
        let addr = ptr.addr();
        self.regions
            .iter()
            .enumerate()
            .find_map(|(region, r)| {
                r.header_offset_of(addr)
                    .map(|offset| BlockId { region, offset })
            })
    }

    pub(crate) fn last_block(&self) -> Option<BlockId> {
        let mut current = self.head?;
        while let Some(next) = self.header(current).next {
            current = next;
        }
        Some(current)
    }

    fn info(&self, id: BlockId, header: &BlockHeader) -> BlockInfo {
        BlockInfo {
            addr: self.regions[id.region].start_addr() + id.offset,
            size: header.size,
            state: header.state,
        }
    }
}

/// Iterator over the blocks of a [`Heap`], created by [`Heap::blocks`].
#[derive(Debug)]
pub struct Blocks<'a> {
    heap: &'a Heap,
    cursor: Option<BlockId>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let header = self.heap.header(id);
        self.cursor = header.next;
        Some(self.heap.info(id, &header))
    }
}
