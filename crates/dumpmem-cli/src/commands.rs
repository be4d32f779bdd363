//! Subcommand implementations. Output goes to the supplied writer.

use crate::hexdump::write_hexdump;
use crate::segments::load_segments;
use anyhow::{Context, Result};
use dumpmem::{PointerSize, SegmentIndex, UncachedMemoryReader};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Read `length` bytes at virtual `address` and hex dump the mapped prefix.
pub fn cmd_read(
    out: &mut impl Write,
    image: &Path,
    segments: &Path,
    address: u64,
    length: u64,
    pointer_size: u32,
) -> Result<()> {
    let pointer_size = PointerSize::try_from(pointer_size)?;
    let index = load_segments(segments)?;
    info!("Loaded {} segments from {}", index.len(), segments.display());

    let reader = UncachedMemoryReader::open(image, index, pointer_size)?;
    let span = mapped_span(reader.segments(), reader.source_len(), address, length);
    let mut buf = alloc_buffer(span)?;
    let n = reader
        .try_read_at_address(address, &mut buf)
        .with_context(|| format!("reading {:#x}", address))?;

    if (n as u64) < length {
        warn!(
            "Partial read: {:#x} of {:#x} bytes mapped at {:#x}",
            n,
            length,
            address
        );
    }

    write_hexdump(out, address, &buf[..n])?;
    reader.close();
    Ok(())
}

/// Read `length` raw bytes at file `offset`.
pub fn cmd_rva(out: &mut impl Write, image: &Path, offset: u64, length: u64) -> Result<()> {
    // Offset reads never consult the segment table.
    let reader = UncachedMemoryReader::open(image, SegmentIndex::default(), PointerSize::default())?;
    let available = reader.source_len().saturating_sub(offset);
    let mut buf = alloc_buffer(length.min(available))?;
    let n = reader.read_at_offset(offset, &mut buf)?;

    if (n as u64) < length {
        warn!(
            "Short read: {:#x} of {:#x} bytes at file offset {:#x} (file is {:#x} bytes)",
            n,
            length,
            offset,
            reader.source_len()
        );
    }

    write_hexdump(out, offset, &buf[..n])?;
    reader.close();
    Ok(())
}

/// Bytes readable from `address` before the first unmapped byte or the end of
/// the file, capped at `limit`.
fn mapped_span(index: &SegmentIndex, source_len: u64, address: u64, limit: u64) -> u64 {
    if address == 0 {
        return 0;
    }

    let mut span = 0u64;
    while span < limit {
        let Some(current) = address.checked_add(span) else {
            break;
        };
        let Some(seg) = index.segment_containing(current) else {
            break;
        };
        let Some(position) = seg.file_offset_of(current) else {
            break;
        };

        let in_segment = seg.size - (current - seg.virtual_address);
        let in_file = source_len.saturating_sub(position);
        let step = in_segment.min(in_file).min(limit - span);
        if step == 0 {
            break;
        }
        span += step;

        // Segment truncated by the end of the file.
        if step < in_segment && span < limit {
            break;
        }
    }
    span
}

/// Zeroed buffer of `len` bytes, failing instead of aborting when it cannot
/// be allocated.
fn alloc_buffer(len: u64) -> Result<Vec<u8>> {
    let len = usize::try_from(len).context("length too large")?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .with_context(|| format!("allocating {:#x} byte buffer", len))?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Print the segment containing `address`.
pub fn cmd_locate(out: &mut impl Write, segments: &Path, address: u64) -> Result<()> {
    let index = load_segments(segments)?;

    match index.locate(address) {
        Some(i) => {
            let seg = &index.as_slice()[i];
            let file_offset = match seg.file_offset_of(address) {
                Some(position) => format!("at file offset {:#x}", position),
                None => "file offset overflows".to_string(),
            };
            writeln!(
                out,
                "{:#x}: segment {} [{:#x}, {:#x}) {}",
                address,
                i,
                seg.virtual_address,
                seg.end(),
                file_offset
            )?;
        }
        None => writeln!(out, "{:#x}: unmapped", address)?,
    }
    Ok(())
}
