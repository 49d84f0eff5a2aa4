// Typed columns. A column is a name in a CSV header plus the type its
// fields decode as. Decoded values are totally ordered; values of different
// types compare numerically, so a float bound can query an integer or
// timestamp key (timestamps count as seconds since the epoch).
//
// Integers compare exactly against floats and timestamps at any magnitude.
// A float against a timestamp compares the float scaled to microseconds, so
// that pair is only as exact as the scaled float.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use strata_base::{err, ErrorKind, Result};

pub const DELIMITER: char = ',';

const MICROS_PER_SEC: f64 = 1_000_000.0;

#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Float,
    /// chrono format strings, tried in order.
    Timestamp(Vec<String>),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(OrderedFloat<f64>),
    /// Microseconds since the Unix epoch, UTC.
    Time(i64),
}

#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Column {
            name: name.into(),
            ty,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Float)
    }

    pub fn timestamp<S: Into<String>>(name: impl Into<String>, formats: impl IntoIterator<Item = S>) -> Self {
        Self::new(name, ColumnType::Timestamp(formats.into_iter().map(Into::into).collect()))
    }

    /// The same type under another name, as aggregated levels store
    /// `<name>_min` and `<name>_max`.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.ty.clone())
    }
}

impl ColumnType {
    pub fn parse(&self, text: &str) -> Result<Value> {
        let text = text.trim();
        match self {
            ColumnType::Int => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| err(ErrorKind::Parse, format!("{:?} is not an integer: {}", text, e))),
            ColumnType::Float => text
                .parse::<f64>()
                .map(|f| Value::Float(OrderedFloat(f)))
                .map_err(|e| err(ErrorKind::Parse, format!("{:?} is not a number: {}", text, e))),
            ColumnType::Timestamp(formats) => formats
                .iter()
                .find_map(|fmt| parse_micros(text, fmt))
                .map(Value::Time)
                .ok_or_else(|| {
                    err(
                        ErrorKind::Parse,
                        format!("{:?} matches none of the formats {:?}", text, formats),
                    )
                }),
        }
    }

    /// Turns a viewport coordinate into a value comparable with this type.
    /// Timestamp coordinates are seconds since the epoch.
    pub fn value_from_f64(&self, x: f64) -> Value {
        match self {
            ColumnType::Int | ColumnType::Float => Value::Float(OrderedFloat(x)),
            ColumnType::Timestamp(_) => Value::Time((x * MICROS_PER_SEC).round() as i64),
        }
    }
}

// Offset-bearing formats first: a naive parse would drop the offset.
fn parse_micros(text: &str, fmt: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
        return Some(dt.timestamp_micros());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
        return Some(dt.and_utc().timestamp_micros());
    }
    let date = NaiveDate::parse_from_str(text, fmt).ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_micros())
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => f.0,
            Value::Time(us) => *us as f64 / MICROS_PER_SEC,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Int(i), Value::Float(f)) => cmp_int_float(*i, f.0),
            (Value::Float(f), Value::Int(i)) => cmp_int_float(*i, f.0).reverse(),
            (Value::Int(i), Value::Time(us)) => cmp_secs_micros(*i, *us),
            (Value::Time(us), Value::Int(i)) => cmp_secs_micros(*i, *us).reverse(),
            (Value::Time(us), Value::Float(f)) => cmp_int_float(*us, f.0 * MICROS_PER_SEC),
            (Value::Float(f), Value::Time(us)) => cmp_int_float(*us, f.0 * MICROS_PER_SEC).reverse(),
        }
    }
}

// NaN sorts above every number, as OrderedFloat orders it.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() || f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => OrderedFloat(whole).cmp(&OrderedFloat(f)),
        ord => ord,
    }
}

fn cmp_secs_micros(secs: i64, micros: i64) -> Ordering {
    (i128::from(secs) * 1_000_000).cmp(&i128::from(micros))
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x.0),
            Value::Time(us) => match DateTime::from_timestamp(
                us.div_euclid(1_000_000),
                (us.rem_euclid(1_000_000) * 1_000) as u32,
            ) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6fZ")),
                None => write!(f, "{}us", us),
            },
        }
    }
}

/// Splits a header record into trimmed column names.
pub fn header_fields(header: &str) -> Vec<String> {
    header.split(DELIMITER).map(|f| f.trim().to_string()).collect()
}

/// Position of `name` in `header`, which must hold it exactly once.
pub fn locate_unique(header: &[String], name: &str) -> Result<usize> {
    let mut found = header.iter().enumerate().filter(|(_, h)| *h == name);
    match (found.next(), found.next()) {
        (Some((pos, _)), None) => Ok(pos),
        (None, _) => Err(err(
            ErrorKind::ColumnNotFound,
            format!("column {:?} not in header {:?}", name, header),
        )),
        (Some(_), Some(_)) => Err(err(
            ErrorKind::Parse,
            format!("column {:?} appears more than once in header {:?}", name, header),
        )),
    }
}

/// The field at `pos` of a record.
pub fn field(record: &str, pos: usize) -> Result<&str> {
    record.split(DELIMITER).nth(pos).ok_or_else(|| {
        err(
            ErrorKind::Parse,
            format!("record {:?} has no field {}", record, pos),
        )
    })
}

/// A set of typed columns located in a header.
#[derive(Clone, Debug)]
pub struct Projection {
    columns: Vec<Column>,
    positions: Vec<usize>,
}

impl Projection {
    pub fn resolve(header: &[String], columns: &[Column]) -> Result<Self> {
        if columns.is_empty() {
            return Err(err(ErrorKind::Contract, "no columns requested"));
        }
        let positions = columns
            .iter()
            .map(|c| locate_unique(header, &c.name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Projection {
            columns: columns.to_vec(),
            positions,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The raw text of the projected fields, in projection order.
    pub fn pick<'a>(&self, record: &'a str) -> Result<Vec<&'a str>> {
        let fields = record.split(DELIMITER).collect::<Vec<_>>();
        self.positions
            .iter()
            .map(|&pos| {
                fields.get(pos).copied().ok_or_else(|| {
                    err(
                        ErrorKind::Parse,
                        format!("record {:?} has no field {}", record, pos),
                    )
                })
            })
            .collect()
    }

    pub fn decode(&self, record: &str) -> Result<Vec<Value>> {
        self.pick(record)?
            .into_iter()
            .zip(self.columns.iter())
            .map(|(text, col)| col.ty.parse(text))
            .collect()
    }
}
