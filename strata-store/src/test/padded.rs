use crate::ioutil::{MemReader, Reader};
use crate::test::{mem, pad_lines};
use crate::{FixedWidthIndex, Records};
use strata_base::{ErrorKind, Result};
use test_log::test;

fn digits() -> FixedWidthIndex<MemReader> {
    let lines = ["h", "0", "1", "22", "3", "444", "5", "6", "7", "8", "9"];
    FixedWidthIndex::open(mem(&lines), 1).unwrap()
}

fn collect(idx: &mut FixedWidthIndex<MemReader>, start: Option<i64>, stop: Option<i64>) -> Vec<String> {
    idx.range(start, stop).unwrap().collect::<Result<Vec<_>>>().unwrap()
}

#[test]
fn test_geometry() {
    let idx = digits();
    assert_eq!(idx.record_len(), 4);
    assert_eq!(idx.len(), 10);
    assert_eq!(idx.offset(), 1);
}

#[test]
fn test_at_agrees_with_scan() {
    let mut idx = digits();
    let all = collect(&mut idx, None, None);
    assert_eq!(all.len(), 10);
    for (i, rec) in all.iter().enumerate() {
        assert_eq!(&idx.at(i as i64).unwrap(), rec);
        assert_eq!(&idx.get(i as u64).unwrap(), rec);
    }
    assert_eq!(all[3], "444");
}

#[test]
fn test_negative_index() {
    let mut idx = digits();
    assert_eq!(idx.at(-1).unwrap(), "9");
    assert_eq!(idx.at(-10).unwrap(), "0");
    assert!(idx.at(-11).unwrap_err().is(ErrorKind::IndexOutOfRange));
    assert!(idx.at(10).unwrap_err().is(ErrorKind::IndexOutOfRange));
}

#[test]
fn test_slice_bounds() {
    let mut idx = digits();
    assert_eq!(collect(&mut idx, Some(2), Some(5)), vec!["22", "3", "444"]);
    assert_eq!(collect(&mut idx, Some(-2), None), vec!["8", "9"]);
    assert_eq!(collect(&mut idx, None, Some(-8)), vec!["0", "1"]);
    assert_eq!(collect(&mut idx, Some(8), Some(100)), vec!["8", "9"]);
    assert!(collect(&mut idx, Some(5), Some(2)).is_empty());
    assert!(collect(&mut idx, Some(100), None).is_empty());
    assert_eq!(collect(&mut idx, Some(-100), Some(1)), vec!["0"]);
}

#[test]
fn test_range_is_restartable() {
    let mut idx = digits();
    let first = collect(&mut idx, Some(1), Some(4));
    let second = collect(&mut idx, Some(1), Some(4));
    assert_eq!(first, second);
}

#[test]
fn test_not_padded() {
    let rd = MemReader::from("aa\nb\ncc\n");
    let e = FixedWidthIndex::open(rd, 0).err().unwrap();
    assert!(e.is(ErrorKind::NotPadded));
    let rd = MemReader::from("no terminator");
    let e = FixedWidthIndex::open(rd, 0).err().unwrap();
    assert!(e.is(ErrorKind::NotPadded));
}

#[test]
fn test_bad_offset() {
    let text = pad_lines(&["a", "b"]);
    let e = FixedWidthIndex::open(MemReader::from(text.as_str()), -1).err().unwrap();
    assert!(e.is(ErrorKind::Offset));
    let e = FixedWidthIndex::open(MemReader::from(text.as_str()), 3).err().unwrap();
    assert!(e.is(ErrorKind::Offset));
    let idx = FixedWidthIndex::open(MemReader::from(text.as_str()), 2).unwrap();
    assert!(idx.is_empty());
}

#[test]
fn test_empty_source() {
    let mut idx = FixedWidthIndex::open(MemReader::from(""), 0).unwrap();
    assert_eq!(idx.len(), 0);
    assert!(collect(&mut idx, None, None).is_empty());
}

#[test]
fn test_independent_cursors() {
    let mut a = digits();
    let mut b = a.try_clone_independent().unwrap();
    let mut it = a.range(None, None).unwrap();
    assert_eq!(it.next().unwrap().unwrap(), "0");
    assert_eq!(b.at(5).unwrap(), "5");
    assert_eq!(it.next().unwrap().unwrap(), "1");
}

#[test]
fn test_prefix_of_source() -> Result<()> {
    let mut rd = mem(&["ab", "cd", "ef"]);
    let size = rd.byte_len()?;
    let mut idx = FixedWidthIndex::new(rd, size - 3, 0)?;
    assert_eq!(idx.len(), 2);
    assert_eq!(idx.at(-1)?, "cd");
    Ok(())
}

#[test]
fn test_open_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("p.csv");
    std::fs::write(&path, pad_lines(&["x,y", "1,10", "2,200"]))?;
    let mut idx = FixedWidthIndex::open_path(&path, 1)?;
    assert_eq!(idx.len(), 2);
    assert_eq!(idx.at(1)?, "2,200");
    Ok(())
}
