// A padded file is a text file whose lines all have exactly the same byte
// length, terminator included. Lines are right-padded with spaces, and the
// last line must be terminated too. That makes line `i` live at byte
// `i * record_len`, so any line or run of lines is one seek away no matter
// how large the file is.
//
// An `offset` hides leading records (usually the header) from addressing:
// index 0 is the first record after them, and `len()` excludes them.

use std::io::{Read, SeekFrom, Seek};
use std::ops::Range;
use std::path::Path;

use crate::ioutil::{decode_record, find_line_end, FileReader, Reader};
use crate::records::{check_scan, resolve_index, resolve_span, RecordIter, Records};
use strata_base::{err, ErrorKind, Result};

pub struct FixedWidthIndex<R: Reader> {
    rd: R,
    record_len: u64,
    total: u64,
    offset: u64,
}

impl<R: Reader> FixedWidthIndex<R> {
    /// Wraps `rd`, whose first `size` bytes must be padded records, hiding
    /// the first `offset` of them.
    pub fn new(mut rd: R, size: u64, offset: i64) -> Result<Self> {
        if offset < 0 {
            return Err(err(ErrorKind::Offset, format!("offset {} is negative", offset)));
        }
        let offset = offset as u64;
        let record_len = if size == 0 {
            0
        } else {
            match find_line_end(&mut rd, 0)? {
                Some(end) if end <= size => end,
                _ => {
                    return Err(err(ErrorKind::NotPadded, "first record has no line terminator"));
                }
            }
        };
        let total = if record_len == 0 { 0 } else { size / record_len };
        if offset > total {
            return Err(err(
                ErrorKind::Offset,
                format!("offset {} must be in [0;{}]", offset, total),
            ));
        }
        if record_len != 0 && size % record_len != 0 {
            return Err(err(
                ErrorKind::NotPadded,
                format!("{} bytes is not a multiple of the {}-byte record", size, record_len),
            ));
        }
        Ok(FixedWidthIndex {
            rd,
            record_len,
            total,
            offset,
        })
    }

    /// Wraps the whole of `rd`.
    pub fn open(mut rd: R, offset: i64) -> Result<Self> {
        let size = rd.byte_len()?;
        Self::new(rd, size, offset)
    }

    /// A second index over the same bytes with its own cursor.
    pub fn try_clone_independent(&self) -> Result<Self> {
        Ok(FixedWidthIndex {
            rd: self.rd.try_clone_independent()?,
            record_len: self.record_len,
            total: self.total,
            offset: self.offset,
        })
    }

    pub fn with_offset(self, offset: i64) -> Result<Self> {
        if offset < 0 || offset as u64 > self.total {
            return Err(err(
                ErrorKind::Offset,
                format!("offset {} must be in [0;{}]", offset, self.total),
            ));
        }
        Ok(FixedWidthIndex {
            offset: offset as u64,
            ..self
        })
    }

    pub fn len(&self) -> u64 {
        self.total - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte length of every record, terminator included.
    pub fn record_len(&self) -> u64 {
        self.record_len
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The record at `index`; negative indices count from the end.
    pub fn at(&mut self, index: i64) -> Result<String> {
        let real = resolve_index(self.offset, self.total, index)?;
        self.read_record(real)
    }

    /// Lazily reads the records selected by slice-style bounds.
    pub fn range(&mut self, start: Option<i64>, stop: Option<i64>) -> Result<RecordIter<'_>> {
        let span = resolve_span(self.offset, self.total, start, stop);
        self.scan_absolute(span)
    }

    fn read_record(&mut self, real: u64) -> Result<String> {
        self.rd.seek(SeekFrom::Start(real * self.record_len))?;
        let mut buf = vec![0_u8; self.record_len as usize];
        self.rd.read_exact(&mut buf)?;
        decode_record(buf)
    }

    fn scan_absolute(&mut self, span: Range<u64>) -> Result<RecordIter<'_>> {
        if !span.is_empty() {
            self.rd.seek(SeekFrom::Start(span.start * self.record_len))?;
        }
        let record_len = self.record_len as usize;
        let rd = &mut self.rd;
        Ok(Box::new(span.map(move |_| {
            let mut buf = vec![0_u8; record_len];
            rd.read_exact(&mut buf)?;
            decode_record(buf)
        })))
    }
}

impl FixedWidthIndex<FileReader> {
    pub fn open_path(path: &Path, offset: i64) -> Result<Self> {
        Self::open(FileReader::try_open_existing(path)?, offset)
    }
}

impl<R: Reader> Records for FixedWidthIndex<R> {
    fn len(&self) -> u64 {
        FixedWidthIndex::len(self)
    }

    fn get(&mut self, index: u64) -> Result<String> {
        if index >= self.len() {
            return Err(err(
                ErrorKind::IndexOutOfRange,
                format!("index {} outside {} records", index, self.len()),
            ));
        }
        self.read_record(index + self.offset)
    }

    fn scan(&mut self, start: u64, stop: u64) -> Result<RecordIter<'_>> {
        check_scan(start, stop, self.len())?;
        self.scan_absolute((start + self.offset)..(stop + self.offset))
    }
}
