//! Uncached segment-backed memory reader.
//!
//! Serves reads straight from the snapshot's byte source with no caching in
//! between. Every read is a seek followed by a read on one shared source, so
//! the source lives behind a mutex that is held for a whole logical read.

use crate::error::{ReaderError, ReaderResult};
use crate::options::{PointerSize, ReaderOptions, SourceOwnership};
use crate::segment::SegmentIndex;
use crate::traits::MemoryReader;
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

/// Reads captured process memory out of a segmented snapshot file.
///
/// # Thread Safety
///
/// The reader is `Sync` whenever the source is `Send`. A `parking_lot::Mutex`
/// serializes every seek+read sequence, so a multi-segment read from one thread
/// never interleaves with a seek from another.
///
/// # Example
///
/// ```rust,ignore
/// use dumpmem::{MemorySegment, ReaderOptions, UncachedMemoryReader};
/// use std::io::Cursor;
///
/// let segments = vec![MemorySegment::new(0x1000, 0x10, 0x0)];
/// let reader = UncachedMemoryReader::new(segments, Cursor::new(image), ReaderOptions::default())?;
/// let mut buf = [0u8; 8];
/// let n = reader.read_at_address(0x1008, &mut buf);
/// ```
pub struct UncachedMemoryReader<S> {
    /// Sorted segment table.
    segments: SegmentIndex,
    /// The shared byte source. None once the reader has been closed.
    source: Mutex<Option<S>>,
    /// Total length of the source, measured at construction.
    source_len: u64,
    pointer_size: PointerSize,
    ownership: SourceOwnership,
}

impl<S: Read + Seek> UncachedMemoryReader<S> {
    /// Create a reader over `source`.
    ///
    /// `segments` must be sorted by virtual address and non-overlapping. The
    /// source length is measured once here by seeking to its end.
    pub fn new(
        segments: impl Into<SegmentIndex>,
        mut source: S,
        options: ReaderOptions,
    ) -> ReaderResult<Self> {
        let segments = segments.into();
        let source_len = source.seek(SeekFrom::End(0))?;

        debug!(
            "Memory reader created: {} segments, {:#x} byte source, {}-byte pointers",
            segments.len(),
            source_len,
            options.pointer_size.bytes()
        );

        Ok(UncachedMemoryReader {
            segments,
            source: Mutex::new(Some(source)),
            source_len,
            pointer_size: options.pointer_size,
            ownership: options.ownership,
        })
    }

    /// Read raw snapshot bytes at file position `offset`.
    ///
    /// Returns `Ok(0)` when `offset` is at or past the end of the source.
    /// Otherwise performs one seek and one read, returning whatever the source
    /// delivered. Source faults propagate, as does use after [`close`](Self::close).
    pub fn read_at_offset(&self, offset: u64, buffer: &mut [u8]) -> ReaderResult<usize> {
        let mut guard = self.source.lock();
        let source = guard.as_mut().ok_or(ReaderError::Closed)?;

        if offset >= self.source_len {
            return Ok(0);
        }

        source.seek(SeekFrom::Start(offset))?;
        Ok(source.read(buffer)?)
    }

    /// Read memory at virtual `address`, returning the number of bytes copied
    /// into `buffer`.
    ///
    /// The read continues across adjacent segments and stops at the first
    /// unmapped byte, so a short count means the rest of the range is not in
    /// the snapshot. Address 0 always reads nothing. An I/O fault reports 0
    /// for the whole call; use [`try_read_at_address`](Self::try_read_at_address)
    /// to tell the two apart.
    pub fn read_at_address(&self, address: u64, buffer: &mut [u8]) -> usize {
        match self.try_read_at_address(address, buffer) {
            Ok(n) => n,
            Err(e) => {
                debug!("Read at {:#x} reported as unmapped: {}", address, e);
                0
            }
        }
    }

    /// Same as [`read_at_address`](Self::read_at_address), but surfaces I/O
    /// faults as [`ReaderError::ReadFault`] and a closed reader as
    /// [`ReaderError::Closed`].
    pub fn try_read_at_address(&self, address: u64, buffer: &mut [u8]) -> ReaderResult<usize> {
        if address == 0 {
            return Ok(0);
        }

        let mut guard = self.source.lock();
        let source = guard.as_mut().ok_or(ReaderError::Closed)?;

        let mut bytes_read = 0usize;

        while bytes_read < buffer.len() {
            let Some(current) = address.checked_add(bytes_read as u64) else {
                break;
            };
            let Some(seg) = self.segments.segment_containing(current) else {
                break;
            };

            let offset = current - seg.virtual_address;
            let remaining = buffer.len() - bytes_read;
            let chunk = usize::try_from(seg.size - offset).map_or(remaining, |n| n.min(remaining));
            let Some(position) = seg.file_offset.checked_add(offset) else {
                break;
            };

            trace!(
                "Chunk {:#x}: {:#x} bytes from file offset {:#x}",
                current,
                chunk,
                position
            );

            let slice = &mut buffer[bytes_read..bytes_read + chunk];
            let read = source
                .seek(SeekFrom::Start(position))
                .and_then(|_| source.read(slice))
                .map_err(|source| ReaderError::ReadFault {
                    address,
                    bytes_read,
                    source,
                })?;

            if read == 0 {
                break;
            }

            bytes_read += read;
        }

        Ok(bytes_read)
    }

    /// Close the reader.
    ///
    /// With [`SourceOwnership::Owned`] the source is dropped and `None` is
    /// returned. With [`SourceOwnership::LeaveOpen`] the untouched source is
    /// handed back to the caller. Closing twice is a no-op returning `None`.
    pub fn close(&self) -> Option<S> {
        let source = self.source.lock().take()?;

        match self.ownership {
            SourceOwnership::Owned => {
                drop(source);
                debug!("Memory reader closed its source");
                None
            }
            SourceOwnership::LeaveOpen => {
                debug!("Memory reader closed, source left open");
                Some(source)
            }
        }
    }
}

impl UncachedMemoryReader<File> {
    /// Open a snapshot file. The reader owns the file and closes it on
    /// [`close`](Self::close) or drop.
    pub fn open(
        path: impl AsRef<Path>,
        segments: impl Into<SegmentIndex>,
        pointer_size: PointerSize,
    ) -> ReaderResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Self::new(
            segments,
            file,
            ReaderOptions::new(pointer_size, SourceOwnership::Owned),
        )
    }
}

impl<S> UncachedMemoryReader<S> {
    /// The segment table.
    pub fn segments(&self) -> &SegmentIndex {
        &self.segments
    }

    /// Length of the byte source in bytes.
    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    pub fn pointer_size(&self) -> PointerSize {
        self.pointer_size
    }

    pub fn ownership(&self) -> SourceOwnership {
        self.ownership
    }

    /// True once [`close`](UncachedMemoryReader::close) has run.
    pub fn is_closed(&self) -> bool {
        self.source.lock().is_none()
    }

    /// Source state for `Debug`. Never blocks, so formatting a reader while a
    /// read holds the lock cannot deadlock.
    fn source_state(&self) -> &'static str {
        match self.source.try_lock() {
            Some(guard) if guard.is_none() => "closed",
            Some(_) => "open",
            None => "locked",
        }
    }
}

impl<S> fmt::Debug for UncachedMemoryReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UncachedMemoryReader")
            .field("segments", &self.segments.len())
            .field("source_len", &self.source_len)
            .field("pointer_size", &self.pointer_size)
            .field("ownership", &self.ownership)
            .field("source", &self.source_state())
            .finish()
    }
}

impl<S: Read + Seek + Send> MemoryReader for UncachedMemoryReader<S> {
    fn pointer_size(&self) -> PointerSize {
        self.pointer_size
    }

    fn read_at_offset(&self, offset: u64, buffer: &mut [u8]) -> ReaderResult<usize> {
        UncachedMemoryReader::read_at_offset(self, offset, buffer)
    }

    fn read(&self, address: u64, buffer: &mut [u8]) -> usize {
        self.read_at_address(address, buffer)
    }
}
