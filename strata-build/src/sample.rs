// Min/max downsampling. Every `period` consecutive input rows collapse into
// one output row carrying the key of the first of them and, per tracked
// column, the smallest low and the largest high seen in the group. A
// trailing partial group still produces a row.
//
// Raw rows supply one value per column that is both low and high. Already
// sampled rows supply a `<col>_min` and a `<col>_max` field. Output values
// are copied as text from the row that attained them, so integers stay
// integers and floats keep their spelling.

use std::io::Write;

use strata_base::{err, ErrorKind, Result};
use strata_store::{field, locate_unique, Column, Projection, Value, DELIMITER};

pub const PERIOD: usize = 2;

pub fn min_name(column: &str) -> String {
    format!("{}_min", column)
}

pub fn max_name(column: &str) -> String {
    format!("{}_max", column)
}

/// The header of a sampled level: `key,c1_min,c1_max,c2_min,c2_max,...`.
pub fn sampled_header(key: &str, tracked: &[Column]) -> String {
    let mut header = key.to_string();
    for col in tracked {
        header.push(DELIMITER);
        header.push_str(&min_name(&col.name));
        header.push(DELIMITER);
        header.push_str(&max_name(&col.name));
    }
    header
}

#[derive(Clone, Debug)]
struct Extreme {
    value: Value,
    text: String,
}

#[derive(Clone, Debug, Default)]
struct Extremes {
    low: Option<Extreme>,
    high: Option<Extreme>,
}

impl Extremes {
    fn observe(&mut self, low: (Value, &str), high: (Value, &str)) {
        if self.low.as_ref().map_or(true, |e| low.0 < e.value) {
            self.low = Some(Extreme {
                value: low.0,
                text: low.1.trim().to_string(),
            });
        }
        if self.high.as_ref().map_or(true, |e| high.0 > e.value) {
            self.high = Some(Extreme {
                value: high.0,
                text: high.1.trim().to_string(),
            });
        }
    }
}

/// Running state of one output group.
#[derive(Clone, Debug)]
pub struct Accumulator {
    period: usize,
    rows: usize,
    key: String,
    columns: Vec<Extremes>,
}

impl Accumulator {
    pub fn new(columns: usize, period: usize) -> Self {
        Accumulator {
            period: period.max(1),
            rows: 0,
            key: String::new(),
            columns: vec![Extremes::default(); columns],
        }
    }

    /// Folds one row in. Returns the finished output record when the row
    /// completes a group.
    pub fn push(&mut self, key: &str, lows: &[(Value, &str)], highs: &[(Value, &str)]) -> Option<String> {
        if self.rows == 0 {
            self.key = key.trim().to_string();
        }
        for ((col, low), high) in self.columns.iter_mut().zip(lows).zip(highs) {
            col.observe(*low, *high);
        }
        self.rows += 1;
        if self.rows == self.period {
            self.take()
        } else {
            None
        }
    }

    /// The record of a trailing partial group, if any.
    pub fn finish(&mut self) -> Option<String> {
        self.take()
    }

    fn take(&mut self) -> Option<String> {
        if self.rows == 0 {
            return None;
        }
        let mut record = std::mem::take(&mut self.key);
        for col in self.columns.iter_mut() {
            let Extremes { low, high } = std::mem::take(col);
            for ext in [low, high] {
                record.push(DELIMITER);
                if let Some(ext) = ext {
                    record.push_str(&ext.text);
                }
            }
        }
        self.rows = 0;
        Some(record)
    }
}

/// Reads one level (or the raw source) and writes the next, coarser one.
pub struct Sampler {
    key: Column,
    key_pos: usize,
    lows: Projection,
    highs: Projection,
    header: String,
    period: usize,
}

impl Sampler {
    /// Samples raw source rows, whose header is `header`.
    pub fn for_source(header: &[String], key: &Column, tracked: &[Column]) -> Result<Self> {
        let key_pos = locate_unique(header, &key.name)?;
        check_tracked(key, tracked)?;
        let lows = Projection::resolve(header, tracked)?;
        Ok(Sampler {
            key: key.clone(),
            key_pos,
            highs: lows.clone(),
            lows,
            header: sampled_header(&key.name, tracked),
            period: PERIOD,
        })
    }

    /// Samples rows of an already sampled level, whose header is `header`.
    pub fn for_level(header: &[String], key: &Column, tracked: &[Column]) -> Result<Self> {
        let key_pos = locate_unique(header, &key.name)?;
        check_tracked(key, tracked)?;
        let mins = tracked.iter().map(|c| c.renamed(min_name(&c.name))).collect::<Vec<_>>();
        let maxs = tracked.iter().map(|c| c.renamed(max_name(&c.name))).collect::<Vec<_>>();
        Ok(Sampler {
            key: key.clone(),
            key_pos,
            lows: Projection::resolve(header, &mins)?,
            highs: Projection::resolve(header, &maxs)?,
            header: sampled_header(&key.name, tracked),
            period: PERIOD,
        })
    }

    pub fn with_period(self, period: usize) -> Self {
        Sampler { period, ..self }
    }

    /// The header of the output level.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Samples `records` (data rows only) into `dst`, preceded by the output
    /// header when `with_header` is set. Returns the data rows written.
    pub fn sample<I, W>(&self, records: I, with_header: bool, dst: &mut W) -> Result<u64>
    where
        I: IntoIterator<Item = Result<String>>,
        W: Write,
    {
        if with_header {
            writeln!(dst, "{}", self.header)?;
        }
        let mut acc = Accumulator::new(self.lows.len(), self.period);
        let mut written = 0;
        for rec in records {
            let rec = rec?;
            let key = field(&rec, self.key_pos)?;
            self.key.ty.parse(key)?;
            let lows = decode_texts(&self.lows, &rec)?;
            let highs = decode_texts(&self.highs, &rec)?;
            if let Some(out) = acc.push(key, &lows, &highs) {
                writeln!(dst, "{}", out)?;
                written += 1;
            }
        }
        if let Some(out) = acc.finish() {
            writeln!(dst, "{}", out)?;
            written += 1;
        }
        dst.flush()?;
        Ok(written)
    }
}

fn check_tracked(key: &Column, tracked: &[Column]) -> Result<()> {
    if tracked.is_empty() {
        return Err(err(ErrorKind::Contract, "no tracked columns"));
    }
    if tracked.iter().any(|c| c.name == key.name) {
        return Err(err(
            ErrorKind::Contract,
            format!("key column {:?} cannot also be tracked", key.name),
        ));
    }
    Ok(())
}

fn decode_texts<'a>(proj: &Projection, record: &'a str) -> Result<Vec<(Value, &'a str)>> {
    let texts = proj.pick(record)?;
    texts
        .into_iter()
        .zip(proj.columns())
        .map(|(text, col)| Ok((col.ty.parse(text)?, text)))
        .collect()
}

