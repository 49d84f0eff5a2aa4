use std::path::PathBuf;

use tracing::debug;

use crate::column::{field, header_fields, locate_unique, Column, Projection, Value};
use crate::concat::ConcatenatedIndex;
use crate::ioutil::{FileReader, Reader};
use crate::padded::FixedWidthIndex;
use crate::records::Records;
use strata_base::{err, ErrorKind, Result};

/// A key and the projected values of one row.
pub type Row = (Value, Vec<Value>);

pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

type Sequence<R> = ConcatenatedIndex<FixedWidthIndex<R>>;

/// Padded CSV parts sorted ascending on a key column, searchable by key.
///
/// Every part is opened twice: one cursor walks keys during bisection and
/// scans, the other decodes value columns, so a range scan reads both in
/// lockstep without reseeking. The header comes from the first record of
/// the first part and is excluded from addressing.
pub struct SortedColumnIndex<R: Reader> {
    keys: Sequence<R>,
    values: Sequence<R>,
    header: Vec<String>,
    key: Column,
    key_pos: usize,
    projection: Projection,
}

impl<R: Reader> SortedColumnIndex<R> {
    pub fn new(parts: Vec<R>, key: Column, columns: &[Column]) -> Result<Self> {
        let mut key_parts = Vec::with_capacity(parts.len());
        let mut value_parts = Vec::with_capacity(parts.len());
        for rd in parts {
            let part = FixedWidthIndex::open(rd, 0)?;
            value_parts.push(part.try_clone_independent()?);
            key_parts.push(part);
        }
        let mut keys = ConcatenatedIndex::new(key_parts, 0)?;
        if keys.is_empty() {
            return Err(err(ErrorKind::Parse, "sorted index has no header"));
        }
        let header = header_fields(&keys.at(0)?);
        let keys = keys.with_offset(1)?;
        let values = ConcatenatedIndex::new(value_parts, 1)?;
        let key_pos = locate_unique(&header, &key.name)?;
        let projection = Projection::resolve(&header, columns)?;
        debug!(target: "strata", rows = keys.len(), key = %key.name, "opened sorted index");
        Ok(SortedColumnIndex {
            keys,
            values,
            header,
            key,
            key_pos,
            projection,
        })
    }

    pub fn len(&self) -> u64 {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn key_column(&self) -> &Column {
        &self.key
    }

    pub fn value_columns(&self) -> &[Column] {
        self.projection.columns()
    }

    /// The decoded key of row `index`.
    pub fn key_at(&mut self, index: u64) -> Result<Value> {
        let record = self.keys.get(index)?;
        self.key.ty.parse(field(&record, self.key_pos)?)
    }

    // First row whose key is not less than `target` (right = false), or
    // first row whose key is greater than `target` (right = true).
    fn bisect(&mut self, target: &Value, right: bool) -> Result<u64> {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let key = self.key_at(mid)?;
            let go_right = if right { key <= *target } else { key < *target };
            if go_right {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    pub fn lower_bound(&mut self, start: Option<&Value>) -> Result<u64> {
        match start {
            None => Ok(0),
            Some(v) => self.bisect(v, false),
        }
    }

    pub fn upper_bound(&mut self, stop: Option<&Value>) -> Result<u64> {
        match stop {
            None => Ok(self.len()),
            Some(v) => self.bisect(v, true),
        }
    }

    /// The row whose key equals `key`; the first of them if there are several.
    pub fn at(&mut self, key: &Value) -> Result<Row> {
        let index = self.bisect(key, false)?;
        let found = if index < self.len() {
            Some(self.key_at(index)?)
        } else {
            None
        };
        match found {
            Some(found) if found == *key => {
                let record = self.values.get(index)?;
                Ok((found, self.projection.decode(&record)?))
            }
            _ => Err(err(ErrorKind::NotFound, format!("no row with key {}", key))),
        }
    }

    /// Every row with `start <= key <= stop`. Both bounds are inclusive and
    /// either may be open.
    pub fn range(&mut self, start: Option<&Value>, stop: Option<&Value>) -> Result<RowIter<'_>> {
        let lo = self.lower_bound(start)?;
        let hi = self.upper_bound(stop)?.max(lo);
        let SortedColumnIndex {
            keys,
            values,
            key,
            key_pos,
            projection,
            ..
        } = self;
        let (ty, key_pos, projection) = (&key.ty, *key_pos, &*projection);
        let rows = keys.scan(lo, hi)?.zip(values.scan(lo, hi)?).map(move |(k, v)| {
            let (k, v) = (k?, v?);
            Ok((ty.parse(field(&k, key_pos)?)?, projection.decode(&v)?))
        });
        Ok(Box::new(rows))
    }

    /// The number of rows `range(start, stop)` yields, without reading them.
    pub fn count_between(&mut self, start: Option<&Value>, stop: Option<&Value>) -> Result<u64> {
        let lo = self.lower_bound(start)?;
        let hi = self.upper_bound(stop)?;
        Ok(hi.saturating_sub(lo))
    }
}

impl SortedColumnIndex<FileReader> {
    pub fn open_paths(paths: &[PathBuf], key: Column, columns: &[Column]) -> Result<Self> {
        let parts = paths
            .iter()
            .map(|p| FileReader::try_open_existing(p.clone()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(parts, key, columns)
    }
}
