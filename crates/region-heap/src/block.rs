//! Block metadata stored in front of every payload.

use derive_more::{Display, IsVariant};

/// Number of bytes occupied by a block header.
///
/// The header sits immediately before the payload, so the payload of a block
/// whose header starts at `addr` begins at `addr + HEADER_SIZE`.
pub const HEADER_SIZE: usize = size_of::<BlockHeader>();

/// Allocation state of a block.
#[repr(u8)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum BlockState {
    #[display("free")]
    Free,
    #[display("allocated")]
    Allocated,
}

/// Position of a block: the index of its region and the byte offset of its
/// header inside that region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockId {
    pub(crate) region: usize,
    pub(crate) offset: usize,
}

impl BlockId {
    /// Returns the id of the block whose header starts right after `size`
    /// payload bytes of this block.
    pub(crate) fn following(self, size: usize) -> Self {
        Self {
            region: self.region,
            offset: self.offset + HEADER_SIZE + size,
        }
    }
}

/// In-memory header of a block.
///
/// Headers are read and written unaligned because a block may start right
/// after a payload of any length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    /// Next block in the chain, `None` for the last block.
    pub(crate) next: Option<BlockId>,
    /// Payload size in bytes, excluding the header.
    pub(crate) size: usize,
    pub(crate) state: BlockState,
}

impl BlockHeader {
    pub(crate) fn free(size: usize, next: Option<BlockId>) -> Self {
        Self {
            next,
            size,
            state: BlockState::Free,
        }
    }

    /// Returns `true` if `other`, described by `other_id`, starts exactly
    /// where this block (at `id`) ends.
    ///
    /// Blocks in different regions are never adjacent.
    pub(crate) fn is_followed_by(&self, id: BlockId, other_id: BlockId) -> bool {
        id.region == other_id.region && id.following(self.size).offset == other_id.offset
    }

    /// Absorbs the directly following block `other` into this one.
    ///
    /// The header of `other` becomes payload of this block.
    pub(crate) fn absorb(&mut self, other: &Self) {
        self.size += HEADER_SIZE + other.size;
        self.next = other.next;
    }
}

/// Snapshot of a block, as returned by [`Heap::blocks`](crate::Heap::blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Address of the block header.
    pub addr: usize,
    /// Payload size in bytes.
    pub size: usize,
    pub state: BlockState,
}

impl BlockInfo {
    /// Address of the first payload byte.
    #[must_use]
    pub fn payload_addr(&self) -> usize {
        self.addr + HEADER_SIZE
    }

    /// Address one past the last payload byte.
    #[must_use]
    pub fn end_addr(&self) -> usize {
        self.payload_addr() + self.size
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::format;

    use super::*;

    const A: BlockId = BlockId {
        region: 0,
        offset: 0,
    };

    #[test]
    fn test_adjacency_within_region() {
        let header = BlockHeader::free(16, None);
        let next = A.following(16);
        assert_eq!(next.offset, HEADER_SIZE + 16);
        assert!(header.is_followed_by(A, next));
        assert!(!header.is_followed_by(A, A.following(17)));
    }

    #[test]
    fn test_no_adjacency_across_regions() {
        let header = BlockHeader::free(16, None);
        let other = BlockId {
            region: 1,
            offset: HEADER_SIZE + 16,
        };
        assert!(!header.is_followed_by(A, other));
    }

    #[test]
    fn test_absorb() {
        let tail = BlockId {
            region: 0,
            offset: 500,
        };
        let mut header = BlockHeader::free(16, Some(A.following(16)));
        header.absorb(&BlockHeader::free(32, Some(tail)));
        assert_eq!(header.size, 16 + HEADER_SIZE + 32);
        assert_eq!(header.next, Some(tail));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", BlockState::Free), "free");
        assert_eq!(format!("{}", BlockState::Allocated), "allocated");
        assert!(BlockState::Free.is_free());
        assert!(BlockState::Allocated.is_allocated());
    }
}
