//! Segment index: virtual address to snapshot file offset translation.
//!
//! The index is a plain sorted slice. Lookups are a binary search over the
//! segment start addresses and never allocate, so a `&SegmentIndex` can be
//! shared freely between threads.

use crate::error::{ReaderError, ReaderResult};
use serde::{Deserialize, Serialize};

/// A contiguous range of captured memory backed by a contiguous range of the
/// snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemorySegment {
    /// First virtual address of the range.
    pub virtual_address: u64,
    /// Length of the range in bytes.
    pub size: u64,
    /// Position of the first byte in the snapshot file.
    pub file_offset: u64,
}

impl MemorySegment {
    pub fn new(virtual_address: u64, size: u64, file_offset: u64) -> Self {
        MemorySegment {
            virtual_address,
            size,
            file_offset,
        }
    }

    /// True if `address` falls in `[virtual_address, virtual_address + size)`.
    #[inline]
    pub fn contains(&self, address: u64) -> bool {
        address >= self.virtual_address && address - self.virtual_address < self.size
    }

    /// Exclusive end address, saturated at `u64::MAX`.
    #[inline]
    pub fn end(&self) -> u64 {
        self.virtual_address.saturating_add(self.size)
    }

    /// File position backing `address`, if this segment contains it.
    pub fn file_offset_of(&self, address: u64) -> Option<u64> {
        if !self.contains(address) {
            return None;
        }
        self.file_offset.checked_add(address - self.virtual_address)
    }
}

/// Immutable, ascending list of non-overlapping segments.
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    segments: Box<[MemorySegment]>,
}

impl SegmentIndex {
    /// Build an index from segments already sorted by `virtual_address` with
    /// no overlaps. The ordering is not re-checked in release builds.
    pub fn new(segments: Vec<MemorySegment>) -> Self {
        debug_assert!(
            Self::validate(&segments).is_ok(),
            "segments must be sorted and non-overlapping"
        );
        SegmentIndex {
            segments: segments.into_boxed_slice(),
        }
    }

    /// Build an index, rejecting unsorted or overlapping input.
    pub fn try_new(segments: Vec<MemorySegment>) -> ReaderResult<Self> {
        Self::validate(&segments)?;
        Ok(SegmentIndex {
            segments: segments.into_boxed_slice(),
        })
    }

    fn validate(segments: &[MemorySegment]) -> ReaderResult<()> {
        for (index, pair) in segments.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.virtual_address < prev.virtual_address {
                return Err(ReaderError::UnsortedSegments { index: index + 1 });
            }
            if next.virtual_address < prev.end() {
                return Err(ReaderError::OverlappingSegments { index: index + 1 });
            }
        }
        Ok(())
    }

    /// Index of the segment containing `address`, or `None` if unmapped.
    pub fn locate(&self, address: u64) -> Option<usize> {
        let mut lower = 0;
        let mut upper = self.segments.len();

        while lower < upper {
            let mid = lower + (upper - lower) / 2;
            let seg = &self.segments[mid];

            if seg.contains(address) {
                return Some(mid);
            }

            if address < seg.virtual_address {
                upper = mid;
            } else {
                lower = mid + 1;
            }
        }

        None
    }

    /// The segment containing `address`, or `None` if unmapped.
    pub fn segment_containing(&self, address: u64) -> Option<&MemorySegment> {
        self.locate(address).map(|i| &self.segments[i])
    }

    pub fn get(&self, index: usize) -> Option<&MemorySegment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemorySegment> {
        self.segments.iter()
    }

    pub fn as_slice(&self) -> &[MemorySegment] {
        &self.segments
    }
}

impl From<Vec<MemorySegment>> for SegmentIndex {
    fn from(segments: Vec<MemorySegment>) -> Self {
        SegmentIndex::new(segments)
    }
}

impl<'a> IntoIterator for &'a SegmentIndex {
    type Item = &'a MemorySegment;
    type IntoIter = std::slice::Iter<'a, MemorySegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SegmentIndex {
        // Gaps at [0x1100, 0x2000) and [0x2200, 0x3000).
        SegmentIndex::new(vec![
            MemorySegment::new(0x1000, 0x100, 0x0),
            MemorySegment::new(0x2000, 0x200, 0x100),
            MemorySegment::new(0x3000, 0x80, 0x300),
        ])
    }

    #[test]
    fn test_contains_bounds() {
        let seg = MemorySegment::new(0x1000, 0x10, 0);
        assert!(!seg.contains(0xFFF));
        assert!(seg.contains(0x1000));
        assert!(seg.contains(0x100F));
        assert!(!seg.contains(0x1010));
    }

    #[test]
    fn test_contains_at_top_of_address_space() {
        let seg = MemorySegment::new(u64::MAX - 0xF, 0x10, 0);
        assert!(seg.contains(u64::MAX));
        assert_eq!(seg.end(), u64::MAX);

        let empty = MemorySegment::new(0x1000, 0, 0);
        assert!(!empty.contains(0x1000));
    }

    #[test]
    fn test_file_offset_of() {
        let seg = MemorySegment::new(0x2000, 0x200, 0x100);
        assert_eq!(seg.file_offset_of(0x2000), Some(0x100));
        assert_eq!(seg.file_offset_of(0x21FF), Some(0x2FF));
        assert_eq!(seg.file_offset_of(0x2200), None);
    }

    #[test]
    fn test_locate_first_and_last_byte() {
        let index = sample_index();
        assert_eq!(index.locate(0x1000), Some(0));
        assert_eq!(index.locate(0x10FF), Some(0));
        assert_eq!(index.locate(0x2000), Some(1));
        assert_eq!(index.locate(0x21FF), Some(1));
        assert_eq!(index.locate(0x3000), Some(2));
        assert_eq!(index.locate(0x307F), Some(2));
    }

    #[test]
    fn test_locate_unmapped() {
        let index = sample_index();
        assert_eq!(index.locate(0), None);
        assert_eq!(index.locate(0xFFF), None);
        assert_eq!(index.locate(0x1100), None);
        assert_eq!(index.locate(0x1FFF), None);
        assert_eq!(index.locate(0x2200), None);
        assert_eq!(index.locate(0x3080), None);
        assert_eq!(index.locate(u64::MAX), None);
    }

    #[test]
    fn test_locate_empty_and_single() {
        assert_eq!(SegmentIndex::default().locate(0x1000), None);

        let single = SegmentIndex::new(vec![MemorySegment::new(0x40, 0x10, 0)]);
        assert_eq!(single.locate(0x48), Some(0));
        assert_eq!(single.locate(0x50), None);
    }

    #[test]
    fn test_locate_many_segments() {
        // 0x100-byte segments every 0x1000, so every other page is a gap.
        let segments: Vec<_> = (0..1000u64)
            .map(|i| MemorySegment::new(i * 0x1000, 0x100, i * 0x100))
            .collect();
        let index = SegmentIndex::new(segments);

        for i in 0..1000u64 {
            assert_eq!(index.locate(i * 0x1000), Some(i as usize));
            assert_eq!(index.locate(i * 0x1000 + 0xFF), Some(i as usize));
            assert_eq!(index.locate(i * 0x1000 + 0x100), None);
        }
    }

    #[test]
    fn test_segment_containing() {
        let index = sample_index();
        let seg = index.segment_containing(0x2010).unwrap();
        assert_eq!(seg.file_offset, 0x100);
        assert!(index.segment_containing(0x2500).is_none());
    }

    #[test]
    fn test_try_new_rejects_unsorted() {
        let result = SegmentIndex::try_new(vec![
            MemorySegment::new(0x2000, 0x10, 0),
            MemorySegment::new(0x1000, 0x10, 0x10),
        ]);
        assert!(matches!(
            result,
            Err(ReaderError::UnsortedSegments { index: 1 })
        ));
    }

    #[test]
    fn test_try_new_rejects_overlap() {
        let result = SegmentIndex::try_new(vec![
            MemorySegment::new(0x1000, 0x10, 0),
            MemorySegment::new(0x2000, 0x100, 0x10),
            MemorySegment::new(0x20FF, 0x10, 0x110),
        ]);
        assert!(matches!(
            result,
            Err(ReaderError::OverlappingSegments { index: 2 })
        ));
    }

    #[test]
    fn test_try_new_accepts_adjacent() {
        let index = SegmentIndex::try_new(vec![
            MemorySegment::new(0x1000, 0x100, 0x500),
            MemorySegment::new(0x1100, 0x100, 0x0),
        ])
        .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.locate(0x10FF), Some(0));
        assert_eq!(index.locate(0x1100), Some(1));
    }
}
