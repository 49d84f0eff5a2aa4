use crate::{pad_all, pad_range, pad_range_to, widest_in_range, write_padded, PadStats};
use strata_base::Result;
use strata_store::ioutil::{MemReader, MemWriter, Writer};
use strata_store::FixedWidthIndex;
use test_log::test;

const TEXT: &str = "x,a,b\n1,2,3\n\n10,200,3000   \n4,5,6";

fn padded(range: Option<std::ops::Range<u64>>) -> Result<(String, PadStats)> {
    let mut src = MemReader::from(TEXT);
    let mut dst = MemWriter::new();
    let stats = match range {
        Some(r) => pad_range(&mut src, r, &mut dst)?,
        None => pad_all(&mut src, &mut dst)?,
    };
    let text = String::from_utf8(dst.into_inner()).unwrap();
    Ok((text, stats))
}

#[test]
fn test_pad_whole() -> Result<()> {
    let (text, stats) = padded(None)?;
    assert_eq!(
        text,
        "x,a,b      \n1,2,3      \n10,200,3000\n4,5,6      \n"
    );
    assert_eq!(stats, PadStats { records: 4, width: 11 });
    assert_eq!(stats.record_len(), 12);
    Ok(())
}

#[test]
fn test_pad_range_uses_own_width() -> Result<()> {
    let (text, stats) = padded(Some(0..12))?;
    assert_eq!(text, "x,a,b\n1,2,3\n");
    assert_eq!(stats.records, 2);
    let (text, _) = padded(Some(28..33))?;
    assert_eq!(text, "4,5,6\n");
    Ok(())
}

#[test]
fn test_pad_range_to_shared_width() -> Result<()> {
    let mut src = MemReader::from(TEXT);
    assert_eq!(widest_in_range(&mut src, 0..12)?, 5);
    assert_eq!(widest_in_range(&mut src, 0..33)?, 11);
    let mut dst = MemWriter::new();
    let stats = pad_range_to(&mut src, 0..12, 11, &mut dst)?;
    assert_eq!(stats, PadStats { records: 2, width: 11 });
    assert_eq!(String::from_utf8(dst.into_inner()).unwrap(), "x,a,b      \n1,2,3      \n");
    Ok(())
}

#[test]
fn test_padded_output_is_indexable() -> Result<()> {
    let mut src = MemReader::from(TEXT);
    let mut dst = MemWriter::new();
    pad_all(&mut src, &mut dst)?;
    let mut idx = FixedWidthIndex::open(dst.try_into_reader()?, 1)?;
    assert_eq!(idx.len(), 3);
    assert_eq!(idx.at(1)?, "10,200,3000");
    Ok(())
}

#[test]
fn test_write_padded_counts_bytes() -> Result<()> {
    let mut dst = MemWriter::new();
    write_padded(&mut dst, "é", 4)?;
    write_padded(&mut dst, "toolong", 3)?;
    assert_eq!(dst.into_inner(), "é  \ntoolong\n".as_bytes());
    Ok(())
}
