//! Core trait for reading captured process memory.
//!
//! The [`MemoryReader`] trait lets diagnostic code (stack walkers, object
//! inspectors, symbol resolvers) work against any snapshot backend.

use crate::error::ReaderResult;
use crate::options::PointerSize;

/// Trait for reading memory out of a snapshot.
///
/// Reads by address follow process-memory semantics: a short count means part
/// of the range is unmapped, and is never an error.
pub trait MemoryReader: Send + Sync {
    /// Pointer width of the captured process.
    fn pointer_size(&self) -> PointerSize;

    /// Read raw snapshot bytes at file position `offset`, bypassing address
    /// translation. Returns 0 when `offset` is past the end of the file.
    fn read_at_offset(&self, offset: u64, buffer: &mut [u8]) -> ReaderResult<usize>;

    /// Read memory at virtual `address` into `buffer`, returning the number of
    /// bytes available before the first unmapped byte.
    fn read(&self, address: u64, buffer: &mut [u8]) -> usize;

    /// Fill `buffer` completely, or report false.
    fn read_exact(&self, address: u64, buffer: &mut [u8]) -> bool {
        self.read(address, buffer) == buffer.len()
    }

    /// Read up to `length` bytes, truncated to what is mapped.
    fn read_vec(&self, address: u64, length: usize) -> Vec<u8> {
        let mut buf = vec![0u8; length];
        let n = self.read(address, &mut buf);
        buf.truncate(n);
        buf
    }

    fn read_u8(&self, address: u64) -> Option<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(address, &mut buf).then(|| buf[0])
    }

    /// Read a little-endian u16.
    fn read_u16(&self, address: u64) -> Option<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(address, &mut buf)
            .then(|| u16::from_le_bytes(buf))
    }

    /// Read a little-endian u32.
    fn read_u32(&self, address: u64) -> Option<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(address, &mut buf)
            .then(|| u32::from_le_bytes(buf))
    }

    /// Read a little-endian u64.
    fn read_u64(&self, address: u64) -> Option<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(address, &mut buf)
            .then(|| u64::from_le_bytes(buf))
    }

    /// Read a pointer-sized value (4 or 8 bytes depending on `pointer_size`).
    fn read_pointer(&self, address: u64) -> Option<u64> {
        match self.pointer_size() {
            PointerSize::Four => self.read_u32(address).map(u64::from),
            PointerSize::Eight => self.read_u64(address),
        }
    }
}
