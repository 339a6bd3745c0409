// Tue Jan 20 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Segment {name} lies outside the file (offset {offset:#x}, size {size:#x})")]
    SegmentOutOfBounds {
        name: String,
        offset: u64,
        size: u64,
    },
    #[error("Segment {name} at {base:#x} + {offset:#x} is past the end of the address space")]
    AddressOverflow {
        name: String,
        base: u64,
        offset: u64,
    },
}
