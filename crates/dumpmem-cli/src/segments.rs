//! Segment table loading for the CLI.

use anyhow::{Context, Result};
use dumpmem::{MemorySegment, SegmentIndex};
use std::fs;
use std::path::Path;

/// Load a JSON segment table and validate its ordering.
pub fn load_segments(path: &Path) -> Result<SegmentIndex> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_segments(&bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Parse a JSON array of segments. Entries are sorted by virtual address
/// before validation, so only true overlaps are rejected.
pub fn parse_segments(json: &[u8]) -> Result<SegmentIndex> {
    let mut segments: Vec<MemorySegment> = serde_json::from_slice(json)?;
    segments.sort_by_key(|s| s.virtual_address);
    Ok(SegmentIndex::try_new(segments)?)
}

/// Parse a decimal or `0x`-prefixed hex number.
pub fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}
