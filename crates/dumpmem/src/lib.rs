//! Uncached memory reader for crash dump snapshots.
//!
//! A snapshot stores the captured process memory as a list of segments, each
//! mapping a contiguous virtual-address range onto a contiguous byte range of
//! the dump file. This crate provides:
//!
//! - [`SegmentIndex`] for translating a virtual address to its segment
//! - [`UncachedMemoryReader`] for serving reads by file offset or by virtual
//!   address against one shared `Read + Seek` source
//! - [`MemoryReader`], the trait diagnostic code (stack walkers, object
//!   inspectors) reads memory through, with typed helpers
//!
//! Parsing the dump container itself is left to the caller, who hands over an
//! already sorted segment list.
//!
//! # Example
//!
//! ```rust,ignore
//! use dumpmem::{MemoryReader, MemorySegment, PointerSize, UncachedMemoryReader};
//!
//! let segments = vec![MemorySegment::new(0x7ff0_0000, 0x1000, 0x400)];
//! let reader = UncachedMemoryReader::open("crash.dmp", segments, PointerSize::Eight)?;
//! let return_address = reader.read_pointer(0x7ff0_0018);
//! ```

pub mod error;
pub mod options;
pub mod segment;
pub mod traits;
pub mod uncached;

// Re-export key types at crate root.
pub use error::{ReaderError, ReaderResult};
pub use options::{PointerSize, ReaderOptions, SourceOwnership};
pub use segment::{MemorySegment, SegmentIndex};
pub use traits::MemoryReader;
pub use uncached::UncachedMemoryReader;
