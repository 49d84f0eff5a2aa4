use crate::{header_fields, locate_unique, Column, ColumnType, Projection, Value};
use ordered_float::OrderedFloat;
use strata_base::{ErrorKind, Result};
use test_log::test;

fn float(x: f64) -> Value {
    Value::Float(OrderedFloat(x))
}

#[test]
fn test_parse_numbers() -> Result<()> {
    assert_eq!(ColumnType::Int.parse(" 42  ")?, Value::Int(42));
    assert_eq!(ColumnType::Float.parse("2.5")?, float(2.5));
    assert_eq!(ColumnType::Float.parse("7")?, float(7.0));
    assert!(ColumnType::Int.parse("4.2").unwrap_err().is(ErrorKind::Parse));
    assert!(ColumnType::Float.parse("abc").unwrap_err().is(ErrorKind::Parse));
    Ok(())
}

#[test]
fn test_parse_timestamps_in_format_order() -> Result<()> {
    let ty = ColumnType::Timestamp(vec![
        "%Y-%m-%d %H:%M:%S".to_string(),
        "%Y-%m-%dT%H:%M:%S%.f%z".to_string(),
        "%Y-%m-%d".to_string(),
    ]);
    assert_eq!(ty.parse("1970-01-01 00:00:01")?, Value::Time(1_000_000));
    assert_eq!(ty.parse("1970-01-01T01:00:00.5+0100")?, Value::Time(500_000));
    assert_eq!(ty.parse("1970-01-02")?, Value::Time(86_400_000_000));
    let e = ty.parse("yesterday").unwrap_err();
    assert!(e.is(ErrorKind::Parse));
    assert!(e.message().contains("%Y-%m-%d"));
    Ok(())
}

#[test]
fn test_mixed_ordering() {
    assert!(Value::Int(3) < float(3.5));
    assert!(float(2.5) < Value::Int(3));
    assert_eq!(Value::Int(3), float(3.0));
    assert!(Value::Time(1_500_000) > float(1.0));
    assert!(Value::Time(1_500_000) < Value::Int(2));
    assert!(Value::Int(-1) < Value::Int(0));
    assert!(Value::Int(-3) < float(-2.5));
    assert!(Value::Int(-2) > float(-2.5));
    assert!(Value::Int(i64::MAX) < float(f64::INFINITY));
    assert!(Value::Int(i64::MIN) > float(f64::NEG_INFINITY));
    assert!(Value::Int(0) < float(f64::NAN));
}

// Past 2^53 an integer no longer survives a trip through f64; ordering must
// stay transitive anyway.
#[test]
fn test_large_ints_order_exactly() {
    let big = 1_i64 << 53;
    let (a, b) = (Value::Int(big), Value::Int(big + 1));
    let f = float(big as f64);
    assert_eq!(a, f);
    assert!(b > f);
    assert!(a < b);
    assert!(Value::Int(i64::MAX) < float(9_223_372_036_854_775_808.0));
    let secs = 1_i64 << 40;
    assert_eq!(Value::Time(secs * 1_000_000), Value::Int(secs));
    assert!(Value::Time(secs * 1_000_000 + 1) > Value::Int(secs));
}

#[test]
fn test_value_from_f64() {
    let ts = ColumnType::Timestamp(vec!["%s".to_string()]);
    assert_eq!(ts.value_from_f64(1.25), Value::Time(1_250_000));
    assert_eq!(ColumnType::Int.value_from_f64(2.5), float(2.5));
    assert!(ColumnType::Int.value_from_f64(2.5) < Value::Int(3));
}

#[test]
fn test_display() {
    assert_eq!(Value::Int(-4).to_string(), "-4");
    assert_eq!(float(0.25).to_string(), "0.25");
    assert_eq!(Value::Time(1_000_000).to_string(), "1970-01-01T00:00:01.000000Z");
}

#[test]
fn test_locate_unique() {
    let header = header_fields("x, a ,b,a");
    assert_eq!(header, vec!["x", "a", "b", "a"]);
    assert_eq!(locate_unique(&header, "b").unwrap(), 2);
    assert!(locate_unique(&header, "z").unwrap_err().is(ErrorKind::ColumnNotFound));
    assert!(locate_unique(&header, "a").unwrap_err().is(ErrorKind::Parse));
}

#[test]
fn test_projection() -> Result<()> {
    let header = header_fields("x,a,b,c");
    let proj = Projection::resolve(&header, &[Column::float("c"), Column::int("a")])?;
    assert_eq!(proj.names().collect::<Vec<_>>(), vec!["c", "a"]);
    assert_eq!(proj.pick("1,2,3,4.5")?, vec!["4.5", "2"]);
    assert_eq!(proj.decode("1,2,3,4.5")?, vec![float(4.5), Value::Int(2)]);
    assert!(proj.decode("1,2").unwrap_err().is(ErrorKind::Parse));
    let missing = Projection::resolve(&header, &[Column::int("q")]).unwrap_err();
    assert!(missing.is(ErrorKind::ColumnNotFound));
    let empty = Projection::resolve(&header, &[]).unwrap_err();
    assert!(empty.is(ErrorKind::Contract));
    Ok(())
}
