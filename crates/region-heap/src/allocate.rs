//! First-fit allocation with lazy coalescing.

use core::ptr::NonNull;

use log::{debug, trace};
use snafu::OptionExt as _;

use crate::{
    block::{BlockHeader, BlockId, BlockState, HEADER_SIZE},
    error::{HeapError, OutOfMemorySnafu, RequestTooLargeSnafu, SizeOverflowSnafu},
    heap::Heap,
};

impl Heap {
    /// Allocates `size` bytes and returns a pointer to the payload.
    ///
    /// Returns `None` if no free block can hold `size` bytes plus a header
    /// for the leftover space, even after merging adjacent free blocks once.
    /// The payload is not aligned beyond one byte.
    pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        self.try_allocate(size).ok()
    }

    /// Allocates `size` bytes, reporting why the allocation failed.
    ///
    /// # Algorithm
    ///
    /// 1. Scan forward from the free hint for the first free block whose
    ///    payload can hold `size + HEADER_SIZE` bytes, and split it.
    /// 2. If the scan fails, merge every pair of physically adjacent free
    ///    blocks, move the hint to the first free block and scan once more.
    pub fn try_allocate(&mut self, size: usize) -> Result<NonNull<u8>, HeapError> {
        let need = size
            .checked_add(HEADER_SIZE)
            .context(RequestTooLargeSnafu { size })?;

        let mut coalesced = false;
        loop {
            if let Some(id) = self.free_hint.and_then(|start| self.first_fit(start, need)) {
                self.split(id, size);
                return Ok(self.payload(id));
            }
            if coalesced {
                debug!("allocation of {size} bytes failed: {:?}", self.stats());
                return OutOfMemorySnafu { size }.fail();
            }
            self.coalesce();
            coalesced = true;
        }
    }

    /// Allocates `count * size` bytes and fills them with zeros.
    ///
    /// Returns `None` if the product overflows or the allocation fails.
    pub fn allocate_zeroed(&mut self, count: usize, size: usize) -> Option<NonNull<u8>> {
        self.try_allocate_zeroed(count, size).ok()
    }

    /// Allocates `count * size` zero-filled bytes, reporting why the
    /// allocation failed.
    pub fn try_allocate_zeroed(
        &mut self,
        count: usize,
        size: usize,
    ) -> Result<NonNull<u8>, HeapError> {
        let total = count
            .checked_mul(size)
            .context(SizeOverflowSnafu { count, size })?;
        let ptr = self.try_allocate(total)?;
        // SAFETY: the block just allocated holds `total` payload bytes.
        unsafe {
            ptr.write_bytes(0, total);
        }
        Ok(ptr)
    }

    /// Returns the first free block at or after `start` whose payload is at
    /// least `need` bytes. The scan does not wrap around.
    fn first_fit(&self, start: BlockId, need: usize) -> Option<BlockId> {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let header = self.header(id);
            if header.state.is_free() && header.size >= need {
                return Some(id);
            }
            cursor = header.next;
        }
        None
    }

    /// Marks the free block `id` allocated with a payload of `size` bytes
    /// and turns the rest into a new free block, which becomes the hint.
    ///
    /// The block must have room for `size + HEADER_SIZE` bytes.
    fn split(&mut self, id: BlockId, size: usize) {
        let header = self.header(id);
        debug_assert!(header.state.is_free());
        debug_assert!(header.size >= size + HEADER_SIZE);

        let rest = id.following(size);
        self.set_header(
            rest,
            BlockHeader::free(header.size - size - HEADER_SIZE, header.next),
        );
        self.set_header(
            id,
            BlockHeader {
                next: Some(rest),
                size,
                state: BlockState::Allocated,
            },
        );
        self.free_hint = Some(rest);
    }

    /// Merges every run of physically adjacent free blocks into one block and
    /// moves the hint to the first free block of the chain.
    pub(crate) fn coalesce(&mut self) {
        let mut merged = 0_usize;
        self.free_hint = None;

        let mut cursor = self.head;
        while let Some(id) = cursor {
            let mut header = self.header(id);
            if header.state.is_free() {
                if self.free_hint.is_none() {
                    self.free_hint = Some(id);
                }
                if let Some(next_id) = header.next {
                    let next = self.header(next_id);
                    if next.state.is_free() && header.is_followed_by(id, next_id) {
                        header.absorb(&next);
                        self.set_header(id, header);
                        merged += 1;
                        // look at the grown block again
                        continue;
                    }
                }
            }
            cursor = header.next;
        }

        trace!(
            "coalesced {merged} blocks, hint at {:?}",
            self.free_hint().map(|b| b.addr)
        );
    }
}
