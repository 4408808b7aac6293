//! Spin-locked wrapper for sharing one heap.

use spin::{Mutex, MutexGuard};

use crate::heap::Heap;

/// A [`Heap`] behind a spin lock, usable as a `static`.
///
/// The heap itself performs no synchronization. This wrapper is for callers
/// that want a single process-wide heap shared between threads or interrupt
/// contexts:
///
/// ```rust
/// use region_heap::LockedHeap;
///
/// static HEAP: LockedHeap = LockedHeap::new();
///
/// let memory = Box::leak(vec![0_u8; 1024].into_boxed_slice());
/// let mut heap = HEAP.lock();
/// unsafe {
///     heap.add_region(memory.as_mut_ptr(), memory.len());
/// }
/// assert!(heap.allocate(64).is_some());
/// ```
#[derive(Debug, Default)]
pub struct LockedHeap {
    heap: Mutex<Heap>,
}

impl LockedHeap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heap: Mutex::new(Heap::new()),
        }
    }

    /// Locks the heap, spinning until it is available.
    #[must_use]
    pub fn lock(&self) -> MutexGuard<'_, Heap> {
        self.heap.lock()
    }

    /// Locks the heap if it is not already locked.
    #[must_use]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Heap>> {
        self.heap.try_lock()
    }
}
