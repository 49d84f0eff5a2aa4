use crate::ioutil::MemReader;
use crate::test::{mem, pad_lines};
use crate::{Column, SortedColumnIndex, Value};
use ordered_float::OrderedFloat;
use strata_base::{ErrorKind, Result};
use test_log::test;

// Keys 1,3,3,3,5,7,9,9,11 split over three parts; the header lives in the
// first.
fn sample() -> SortedColumnIndex<MemReader> {
    let parts = vec![
        mem(&["k,v,w", "1,10,0.5", "3,30,1.5", "3,31,2.5"]),
        mem(&["3,32,3.5", "5,50,4.5"]),
        mem(&["7,70,5.5", "9,90,6.5", "9,91,7.5", "11,110,8.5"]),
    ];
    SortedColumnIndex::new(parts, Column::int("k"), &[Column::int("v"), Column::float("w")]).unwrap()
}

fn int(i: i64) -> Value {
    Value::Int(i)
}

fn keys(idx: &mut SortedColumnIndex<MemReader>, start: Option<Value>, stop: Option<Value>) -> Vec<i64> {
    idx.range(start.as_ref(), stop.as_ref())
        .unwrap()
        .map(|row| match row.unwrap().0 {
            Value::Int(i) => i,
            other => panic!("unexpected key {:?}", other),
        })
        .collect()
}

#[test]
fn test_len_and_header() {
    let idx = sample();
    assert_eq!(idx.len(), 9);
    assert_eq!(idx.header(), &["k", "v", "w"]);
    assert_eq!(idx.value_columns().len(), 2);
}

#[test]
fn test_at() -> Result<()> {
    let mut idx = sample();
    let (k, vals) = idx.at(&int(3))?;
    assert_eq!(k, int(3));
    assert_eq!(vals, vec![int(30), Value::Float(OrderedFloat(1.5))]);
    let (_, vals) = idx.at(&int(9))?;
    assert_eq!(vals[0], int(90));
    assert!(idx.at(&int(4)).unwrap_err().is(ErrorKind::NotFound));
    assert!(idx.at(&int(12)).unwrap_err().is(ErrorKind::NotFound));
    assert!(idx.at(&int(0)).unwrap_err().is(ErrorKind::NotFound));
    Ok(())
}

#[test]
fn test_at_returns_the_stored_key() -> Result<()> {
    let mut idx = sample();
    let (k, vals) = idx.at(&Value::Float(OrderedFloat(5.0)))?;
    assert!(matches!(k, Value::Int(5)));
    assert_eq!(vals[0], int(50));
    assert!(idx.at(&Value::Float(OrderedFloat(5.5))).unwrap_err().is(ErrorKind::NotFound));
    Ok(())
}

#[test]
fn test_range_is_inclusive() {
    let mut idx = sample();
    assert_eq!(keys(&mut idx, Some(int(3)), Some(int(9))), vec![3, 3, 3, 5, 7, 9, 9]);
    assert_eq!(keys(&mut idx, Some(int(4)), Some(int(8))), vec![5, 7]);
    assert_eq!(keys(&mut idx, None, Some(int(3))), vec![1, 3, 3, 3]);
    assert_eq!(keys(&mut idx, Some(int(10)), None), vec![11]);
    assert_eq!(keys(&mut idx, None, None).len(), 9);
    assert!(keys(&mut idx, Some(int(8)), Some(int(4))).is_empty());
    assert!(keys(&mut idx, Some(int(12)), None).is_empty());
}

#[test]
fn test_range_with_float_bounds() {
    let mut idx = sample();
    let lo = Value::Float(OrderedFloat(2.5));
    let hi = Value::Float(OrderedFloat(7.0));
    assert_eq!(keys(&mut idx, Some(lo), Some(hi)), vec![3, 3, 3, 5, 7]);
}

#[test]
fn test_count_matches_range() -> Result<()> {
    let mut idx = sample();
    let bounds = [None, Some(0), Some(1), Some(3), Some(4), Some(9), Some(11), Some(12)];
    for a in bounds.iter() {
        for b in bounds.iter() {
            let (a, b) = (a.map(int), b.map(int));
            let counted = idx.count_between(a.as_ref(), b.as_ref())?;
            let scanned = idx.range(a.as_ref(), b.as_ref())?.count() as u64;
            assert_eq!(counted, scanned, "{:?}..={:?}", a, b);
        }
    }
    Ok(())
}

#[test]
fn test_rows_pair_keys_with_values() -> Result<()> {
    let mut idx = sample();
    let rows = idx.range(Some(&int(5)), Some(&int(9)))?.collect::<Result<Vec<_>>>()?;
    let pairs = rows
        .iter()
        .map(|(k, v)| (*k, v[0]))
        .collect::<Vec<_>>();
    assert_eq!(
        pairs,
        vec![(int(5), int(50)), (int(7), int(70)), (int(9), int(90)), (int(9), int(91))]
    );
    Ok(())
}

#[test]
fn test_open_errors() {
    let parts = || vec![mem(&["k,v", "1,2"])];
    let e = SortedColumnIndex::new(parts(), Column::int("x"), &[Column::int("v")]).err().unwrap();
    assert!(e.is(ErrorKind::ColumnNotFound));
    let e = SortedColumnIndex::new(parts(), Column::int("k"), &[Column::int("q")]).err().unwrap();
    assert!(e.is(ErrorKind::ColumnNotFound));
    let e = SortedColumnIndex::new(parts(), Column::int("k"), &[]).err().unwrap();
    assert!(e.is(ErrorKind::Contract));
    let e = SortedColumnIndex::new(vec![MemReader::from("")], Column::int("k"), &[Column::int("v")]).err().unwrap();
    assert!(e.is(ErrorKind::Parse));
}

#[test]
fn test_open_paths() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let a = dir.path().join("0.csv");
    let b = dir.path().join("1.csv");
    std::fs::write(&a, pad_lines(&["t,v", "1,5"]))?;
    std::fs::write(&b, pad_lines(&["2,6", "4,8"]))?;
    let mut idx = SortedColumnIndex::open_paths(&[a, b], Column::int("t"), &[Column::int("v")])?;
    assert_eq!(idx.len(), 3);
    assert_eq!(idx.count_between(Some(&int(2)), None)?, 2);
    assert_eq!(idx.at(&int(4))?.1, vec![int(8)]);
    Ok(())
}
