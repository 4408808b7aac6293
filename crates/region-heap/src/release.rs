//! Block release with opportunistic merging.

use crate::{block::BlockState, heap::Heap};

impl Heap {
    /// Releases the block whose payload starts at `ptr`.
    ///
    /// Releasing a null pointer does nothing. If the hinted free block
    /// directly follows the released block, both are merged and the hint
    /// moves to the merged block. No other merging happens here; the full
    /// pass runs lazily when an allocation fails.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// - `ptr` is null or was returned by this heap and not released since
    /// - The payload behind `ptr` is no longer in use
    pub unsafe fn release(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let id = self.locate(ptr);
        debug_assert!(id.is_some(), "released pointer {ptr:p} is outside every region");
        let Some(id) = id else {
            return;
        };

        let mut header = self.header(id);
        debug_assert!(header.state.is_allocated(), "double release of {ptr:p}");
        header.state = BlockState::Free;

        if let Some(next_id) = header.next
            && self.free_hint == Some(next_id)
            && header.is_followed_by(id, next_id)
        {
            header.absorb(&self.header(next_id));
            self.free_hint = Some(id);
        }
        self.set_header(id, header);
    }
}
