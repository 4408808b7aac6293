//! In-place resizing with an allocate-and-copy fallback.

use core::ptr::NonNull;

use crate::{
    block::{BlockHeader, BlockState},
    heap::Heap,
};

impl Heap {
    /// Resizes the block whose payload starts at `ptr` to `new_size` bytes.
    ///
    /// - A null `ptr` behaves like [`allocate`](Self::allocate).
    /// - If the next block is free, directly follows this one and the two
    ///   payloads together hold `new_size` bytes, the block is resized in
    ///   place and `ptr` is returned unchanged. This covers both growing and
    ///   shrinking.
    /// - Otherwise a new block is allocated, `min(new_size, old_size)` bytes
    ///   are copied over and the old block is marked free.
    ///
    /// Returns `None` if no block can hold `new_size` bytes. In that case the
    /// original block stays allocated and its contents are untouched.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` is null or was returned by this heap
    /// and not released since. On success the old pointer must no longer be
    /// used unless it was returned again.
    pub unsafe fn reallocate(&mut self, ptr: *mut u8, new_size: usize) -> Option<NonNull<u8>> {
        if ptr.is_null() {
            return self.allocate(new_size);
        }
        let id = self.locate(ptr);
        debug_assert!(id.is_some(), "reallocated pointer {ptr:p} is outside every region");
        let id = id?;

        let mut current = self.header(id);
        debug_assert!(current.state.is_allocated());

        if let Some(next_id) = current.next {
            let next = self.header(next_id);
            if next.state.is_free()
                && current.is_followed_by(id, next_id)
                && current.size + next.size >= new_size
            {
                let leftover = current.size + next.size - new_size;
                let retarget_hint = self.free_hint == Some(next_id);

                let rest = id.following(new_size);
                self.set_header(rest, BlockHeader::free(leftover, next.next));
                current.size = new_size;
                current.next = Some(rest);
                self.set_header(id, current);

                if retarget_hint {
                    self.free_hint = Some(rest);
                }
                return NonNull::new(ptr);
            }
        }

        let new_ptr = self.allocate(new_size)?;
        // SAFETY: both blocks are allocated and distinct, and each holds at
        // least `min(new_size, current.size)` bytes.
        unsafe {
            new_ptr
                .as_ptr()
                .copy_from_nonoverlapping(ptr, new_size.min(current.size));
        }
        let mut current = self.header(id);
        current.state = BlockState::Free;
        self.set_header(id, current);
        Some(new_ptr)
    }
}
