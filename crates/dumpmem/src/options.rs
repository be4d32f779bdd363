//! Reader configuration supplied by whoever opens the snapshot.

use crate::error::{ReaderError, ReaderResult};

/// Width of a pointer in the captured process.
///
/// Informational for the reader itself; callers use it to decode pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerSize {
    Four,
    #[default]
    Eight,
}

impl PointerSize {
    /// Pointer width in bytes.
    pub fn bytes(self) -> usize {
        match self {
            PointerSize::Four => 4,
            PointerSize::Eight => 8,
        }
    }
}

impl TryFrom<u32> for PointerSize {
    type Error = ReaderError;

    fn try_from(value: u32) -> ReaderResult<Self> {
        match value {
            4 => Ok(PointerSize::Four),
            8 => Ok(PointerSize::Eight),
            n => Err(ReaderError::InvalidPointerSize(n)),
        }
    }
}

/// Who is responsible for the byte source once the reader is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceOwnership {
    /// The reader opened the source; closing the reader closes it.
    #[default]
    Owned,
    /// The caller keeps the source; closing the reader hands it back.
    LeaveOpen,
}

/// Options for constructing an [`UncachedMemoryReader`](crate::UncachedMemoryReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReaderOptions {
    pub pointer_size: PointerSize,
    pub ownership: SourceOwnership,
}

impl ReaderOptions {
    pub fn new(pointer_size: PointerSize, ownership: SourceOwnership) -> Self {
        ReaderOptions {
            pointer_size,
            ownership,
        }
    }

    pub fn with_pointer_size(mut self, pointer_size: PointerSize) -> Self {
        self.pointer_size = pointer_size;
        self
    }

    /// Leave the byte source open for the caller when the reader is closed.
    pub fn leave_open(mut self) -> Self {
        self.ownership = SourceOwnership::LeaveOpen;
        self
    }
}
