//! First-fit block allocator over caller-supplied memory regions.
//!
//! This crate provides a small dynamic-memory allocator for environments
//! that have no operating-system heap. The caller hands one or more raw
//! memory extents to a [`Heap`], then requests, releases and resizes
//! sub-blocks carved out of those extents.
//!
//! # Algorithm
//!
//! Every byte of every registered region belongs to exactly one block. Each
//! block starts with a [`HEADER_SIZE`]-byte header followed by its payload,
//! and all blocks form a single chain. Within a region the chain runs in
//! ascending address order; regions follow each other in the order they were
//! registered, wherever they live in memory:
//!
//! ```text
//!  region 0                                    region 1
//! ┌────────┬─────────┬────────┬──────────────┐ ┌────────┬─────────────────┐
//! │ header │ payload │ header │ payload      │ │ header │ payload         │
//! │ alloc  │         │ free   │              │ │ free   │                 │
//! └───┬────┴─────────┴───▲─┬──┴──────────────┘ └───▲────┴─────────────────┘
//!     └──────────────────┘ └───────────────────────┘
//!                        ▲
//!                        └── free hint
//! ```
//!
//! - **Allocation**: first-fit scan starting at the *free hint*. If nothing
//!   fits, one coalescing pass merges physically adjacent free blocks and the
//!   scan is retried exactly once.
//! - **Release**: marks the block free and, when the hinted block directly
//!   follows it, merges the two in O(1).
//! - **Reallocation**: grows or shrinks in place into a following free block
//!   when possible, otherwise falls back to allocate + copy + release. A
//!   failed reallocation leaves the original block untouched.
//!
//! Blocks in different regions are never merged, even if the regions happen
//! to be adjacent in the address space.
//!
//! # Usage Example
//!
//! ```rust
//! use region_heap::{HEADER_SIZE, Heap};
//!
//! let mut memory = vec![0_u8; 4000];
//! let mut heap = Heap::new();
//! unsafe {
//!     heap.add_region(memory.as_mut_ptr(), memory.len());
//! }
//!
//! let ptr = heap.allocate(5).unwrap();
//! assert_eq!(ptr.as_ptr(), memory.as_mut_ptr().wrapping_add(HEADER_SIZE));
//!
//! unsafe {
//!     let ptr = heap.reallocate(ptr.as_ptr(), 6).unwrap();
//!     heap.release(ptr.as_ptr());
//! }
//! ```
//!
//! # Limitations
//!
//! - Payload alignment is not guaranteed.
//! - Pointers passed to [`Heap::release`] and [`Heap::reallocate`] are not
//!   validated beyond a debug assertion.
//! - [`Heap`] is `Send` but not `Sync`; concurrent use requires external
//!   synchronization, for example through [`LockedHeap`].

#![no_std]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod allocate;
mod block;
mod error;
mod heap;
mod locked;
mod reallocate;
mod region;
mod register;
mod release;
mod stats;

pub use self::{
    block::{BlockInfo, BlockState, HEADER_SIZE},
    error::HeapError,
    heap::{Blocks, Heap},
    locked::LockedHeap,
    region::MAX_REGIONS,
    stats::HeapStats,
};
