//! Error types for snapshot memory reads.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or using a memory reader.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The underlying byte source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file could not be opened.
    #[error("Failed to open snapshot {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The byte source failed in the middle of an address read.
    #[error("Read fault at {address:#x} after {bytes_read} bytes: {source}")]
    ReadFault {
        address: u64,
        bytes_read: usize,
        #[source]
        source: std::io::Error,
    },

    /// The reader has been closed and no longer holds a byte source.
    #[error("Memory reader has been closed")]
    Closed,

    /// Segment `index` starts below its predecessor.
    #[error("Segment {index} is not sorted by virtual address")]
    UnsortedSegments { index: usize },

    /// Segment `index` starts inside its predecessor.
    #[error("Segment {index} overlaps the preceding segment")]
    OverlappingSegments { index: usize },

    /// Only 4 and 8 byte pointers are supported.
    #[error("Invalid pointer size: {0}")]
    InvalidPointerSize(u32),
}

/// Result type for memory reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;
