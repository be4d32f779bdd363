//! Classic 16-bytes-per-line hex dump.

use std::io::{self, Write};

const BYTES_PER_LINE: usize = 16;

/// Write `data` as hex + ASCII lines labelled from `base`.
pub fn write_hexdump(out: &mut impl Write, base: u64, data: &[u8]) -> io::Result<()> {
    for (i, line) in data.chunks(BYTES_PER_LINE).enumerate() {
        let addr = base.wrapping_add((i * BYTES_PER_LINE) as u64);
        write!(out, "{:016x}  ", addr)?;

        for col in 0..BYTES_PER_LINE {
            match line.get(col) {
                Some(b) => write!(out, "{:02x} ", b)?,
                None => write!(out, "   ")?,
            }
            if col == 7 {
                write!(out, " ")?;
            }
        }

        let ascii: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        writeln!(out, " |{}|", ascii)?;
    }
    Ok(())
}
