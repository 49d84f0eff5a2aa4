use std::ops::Range;

use strata_base::Result;
use strata_store::ioutil::{decode_record, find_line_end, lines_in_range, Reader};

/// Splits the first `size` bytes of `rd` into at most `count` contiguous
/// byte ranges, each ending just after a line terminator (or at `size`).
///
/// The i-th cut aims at byte `i * size / count - 1` and moves forward to the
/// end of the line holding it, so no line is ever split. Cuts that collapse
/// onto the same line end are merged, so short inputs yield fewer chunks.
pub fn compute_chunks(rd: &mut impl Reader, size: u64, count: usize) -> Result<Vec<Range<u64>>> {
    if size == 0 || count == 0 {
        return Ok(Vec::new());
    }
    let mut cuts = vec![0_u64];
    for i in 1..=count as u128 {
        let aim = (i * size as u128 / count as u128) as u64;
        let pos = aim.saturating_sub(1);
        let cut = match find_line_end(rd, pos)? {
            Some(end) => end.min(size),
            None => size,
        };
        if cuts.last() != Some(&cut) {
            cuts.push(cut);
        }
    }
    Ok(cuts.windows(2).map(|w| w[0]..w[1]).collect())
}

/// Splits `rows` rows into at most `count` contiguous ranges that each start
/// on an even row, so pairing rows within a range pairs them globally.
pub fn row_chunks(rows: u64, count: usize) -> Vec<Range<u64>> {
    let pairs = rows.div_ceil(2);
    let count = (count.max(1) as u64).min(pairs.max(1));
    (0..count)
        .map(|i| {
            let lo = (pairs * i / count * 2).min(rows);
            let hi = (pairs * (i + 1) / count * 2).min(rows);
            lo..hi
        })
        .filter(|r| !r.is_empty())
        .collect()
}

/// The non-blank lines of `range`, trailing whitespace removed.
pub fn records_in_range<'a, R: Reader>(
    rd: &'a mut R,
    range: Range<u64>,
) -> Result<impl Iterator<Item = Result<String>> + 'a> {
    let records = lines_in_range(rd, range)?
        .map(|line| decode_record(line?))
        .filter(|rec| !matches!(rec, Ok(text) if text.is_empty()));
    Ok(records)
}
