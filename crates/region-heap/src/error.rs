//! Errors reported by the fallible heap operations.

use snafu::{Location, Snafu};

use crate::block::HEADER_SIZE;

/// Reasons a heap operation could not be carried out.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HeapError {
    #[snafu(display("region start address is null"))]
    NullRegion {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("region of {len} bytes cannot hold a {HEADER_SIZE}-byte block header"))]
    RegionTooSmall {
        len: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("region table is full ({capacity} regions)"))]
    RegionTableFull {
        capacity: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("request of {size} bytes overflows when the block header is added"))]
    RequestTooLarge {
        size: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("zeroed allocation of {count} x {size} bytes overflows"))]
    SizeOverflow {
        count: usize,
        size: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("out of memory: no free block can hold {size} bytes"))]
    OutOfMemory {
        size: usize,
        #[snafu(implicit)]
        location: Location,
    },
}
