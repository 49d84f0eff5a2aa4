use std::io::Write;
use std::ops::Range;

use strata_base::Result;
use strata_store::ioutil::{Reader, Writer};

use crate::chunks::records_in_range;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PadStats {
    /// Records written, header included.
    pub records: u64,
    /// Record width without the terminator.
    pub width: u64,
}

impl PadStats {
    pub fn record_len(&self) -> u64 {
        self.width + 1
    }
}

/// Writes `record` right-padded with spaces to `width` bytes, then `\n`.
pub fn write_padded(dst: &mut impl Write, record: &str, width: u64) -> Result<()> {
    let fill = (width as usize).saturating_sub(record.len());
    dst.write_all(record.as_bytes())?;
    dst.write_all(" ".repeat(fill).as_bytes())?;
    dst.write_all(b"\n")?;
    Ok(())
}

/// The byte length of the longest record of `range`.
pub fn widest_in_range<R: Reader>(src: &mut R, range: Range<u64>) -> Result<u64> {
    let mut width = 0;
    for rec in records_in_range(src, range)? {
        width = width.max(rec?.len() as u64);
    }
    Ok(width)
}

/// Pads the records of `range` in `src` to `width` bytes. Blank lines are
/// dropped and trailing whitespace is replaced by padding.
pub fn pad_range_to<R: Reader, W: Writer>(src: &mut R, range: Range<u64>, width: u64, dst: &mut W) -> Result<PadStats> {
    let mut records = 0;
    for rec in records_in_range(src, range)? {
        write_padded(dst, &rec?, width)?;
        records += 1;
    }
    dst.flush()?;
    Ok(PadStats { records, width })
}

/// Pads the lines of `range` in `src` to the width of the longest one.
pub fn pad_range<R: Reader, W: Writer>(src: &mut R, range: Range<u64>, dst: &mut W) -> Result<PadStats> {
    let width = widest_in_range(src, range.clone())?;
    pad_range_to(src, range, width, dst)
}

/// Pads every line of `src`.
pub fn pad_all<R: Reader, W: Writer>(src: &mut R, dst: &mut W) -> Result<PadStats> {
    let size = src.byte_len()?;
    pad_range(src, 0..size, dst)
}
