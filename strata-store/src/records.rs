use std::ops::Range;

use strata_base::{err, Error, ErrorKind, Result};

pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// A random-access sequence of text records, addressed from zero.
///
/// Implemented by single padded files and by concatenations of them, so
/// concatenations nest.
pub trait Records {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&mut self, index: u64) -> Result<String>;

    /// Streams records `start..stop`. Requires `start <= stop <= len()`.
    fn scan(&mut self, start: u64, stop: u64) -> Result<RecordIter<'_>>;
}

pub(crate) fn failed<'a>(e: Error) -> RecordIter<'a> {
    Box::new(std::iter::once(Err(e)))
}

pub(crate) fn check_scan(start: u64, stop: u64, len: u64) -> Result<()> {
    if start > stop || stop > len {
        return Err(err(
            ErrorKind::IndexOutOfRange,
            format!("scan {}..{} outside 0..{}", start, stop, len),
        ));
    }
    Ok(())
}

/// Maps a possibly-negative index onto an absolute record number in
/// `offset..total`. Negative indices count back from `total`.
pub(crate) fn resolve_index(offset: u64, total: u64, index: i64) -> Result<u64> {
    let (offset, total) = (offset as i128, total as i128);
    let real = if index >= 0 {
        index as i128 + offset
    } else {
        total + index as i128
    };
    if real < offset || real >= total {
        return Err(err(
            ErrorKind::IndexOutOfRange,
            format!("index {} outside {} records", index, total - offset),
        ));
    }
    Ok(real as u64)
}

/// Maps slice-style bounds onto an absolute record span inside
/// `offset..total`. Missing bounds mean "from the first" and "to the last";
/// negative bounds count back from `total`; everything is clamped, so the
/// result may be empty but is never inverted.
pub(crate) fn resolve_span(
    offset: u64,
    total: u64,
    start: Option<i64>,
    stop: Option<i64>,
) -> Range<u64> {
    let (offset, total) = (offset as i128, total as i128);
    let lo = match start {
        None => offset,
        Some(s) if s >= 0 => offset + s as i128,
        Some(s) => (total + s as i128).max(offset),
    };
    let hi = match stop {
        None => total,
        Some(s) if s >= 0 => (offset + s as i128).min(total),
        Some(s) => total + s as i128,
    };
    let lo = lo.min(total);
    let hi = hi.max(lo);
    (lo as u64)..(hi as u64)
}
