use std::ops::Range;

use crate::records::{check_scan, failed, resolve_index, resolve_span, RecordIter, Records};
use strata_base::{err, ErrorKind, Result};

/// Several record sequences presented as one, in order.
///
/// A parallel build writes one file per chunk; a level is the ordered union
/// of those chunk files. The `offset` hides records at the front of the
/// first part only (the header lives there).
pub struct ConcatenatedIndex<S> {
    parts: Vec<S>,
    // ends[i] is the absolute position just past part i.
    ends: Vec<u64>,
    total: u64,
    offset: u64,
}

impl<S: Records> ConcatenatedIndex<S> {
    pub fn new(parts: Vec<S>, offset: i64) -> Result<Self> {
        let mut ends = Vec::with_capacity(parts.len());
        let mut total = 0;
        for part in parts.iter() {
            total += part.len();
            ends.push(total);
        }
        let offset = check_offset(offset, total)?;
        Ok(ConcatenatedIndex {
            parts,
            ends,
            total,
            offset,
        })
    }

    pub fn with_offset(self, offset: i64) -> Result<Self> {
        let offset = check_offset(offset, self.total)?;
        Ok(ConcatenatedIndex { offset, ..self })
    }

    pub fn len(&self) -> u64 {
        self.total - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parts(&self) -> &[S] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<S> {
        self.parts
    }

    /// The record at `index`; negative indices count from the end.
    pub fn at(&mut self, index: i64) -> Result<String> {
        let real = resolve_index(self.offset, self.total, index)?;
        let (part, local) = self.locate(real);
        self.parts[part].get(local)
    }

    /// Lazily streams the records selected by slice-style bounds, one part
    /// at a time.
    pub fn range(&mut self, start: Option<i64>, stop: Option<i64>) -> Result<RecordIter<'_>> {
        let span = resolve_span(self.offset, self.total, start, stop);
        Ok(self.scan_absolute(span))
    }

    fn part_start(&self, part: usize) -> u64 {
        if part == 0 {
            0
        } else {
            self.ends[part - 1]
        }
    }

    // Requires real < total.
    fn locate(&self, real: u64) -> (usize, u64) {
        let part = self.ends.partition_point(|&end| end <= real);
        (part, real - self.part_start(part))
    }

    fn scan_absolute(&mut self, span: Range<u64>) -> RecordIter<'_> {
        let clipped = (0..self.parts.len())
            .map(|i| clip(self.part_start(i)..self.ends[i], &span))
            .collect::<Vec<_>>();
        Box::new(
            self.parts
                .iter_mut()
                .zip(clipped)
                .filter_map(|(part, local)| local.map(|local| (part, local)))
                .flat_map(|(part, local)| match part.scan(local.start, local.end) {
                    Ok(records) => records,
                    Err(e) => failed(e),
                }),
        )
    }
}

impl<S: Records> Records for ConcatenatedIndex<S> {
    fn len(&self) -> u64 {
        ConcatenatedIndex::len(self)
    }

    fn get(&mut self, index: u64) -> Result<String> {
        if index >= self.len() {
            return Err(err(
                ErrorKind::IndexOutOfRange,
                format!("index {} outside {} records", index, self.len()),
            ));
        }
        let (part, local) = self.locate(index + self.offset);
        self.parts[part].get(local)
    }

    fn scan(&mut self, start: u64, stop: u64) -> Result<RecordIter<'_>> {
        check_scan(start, stop, self.len())?;
        Ok(self.scan_absolute((start + self.offset)..(stop + self.offset)))
    }
}

fn check_offset(offset: i64, total: u64) -> Result<u64> {
    if offset < 0 || offset as u64 > total {
        return Err(err(
            ErrorKind::Offset,
            format!("offset {} must be in [0;{}]", offset, total),
        ));
    }
    Ok(offset as u64)
}

/// The part-local sub-span of `span` that falls inside `part`, if any.
/// A part entirely inside `span` comes back whole.
pub(crate) fn clip(part: Range<u64>, span: &Range<u64>) -> Option<Range<u64>> {
    let lo = part.start.max(span.start);
    let hi = part.end.min(span.end);
    if lo >= hi {
        None
    } else {
        Some((lo - part.start)..(hi - part.start))
    }
}
