use crate::{BuildOptions, BuildStatus, Column, Pyramid, PyramidBuilder, Response, Result, Value, ViewOptions, ViewportWorker};
use test_log::test;

#[test]
fn test_build_then_view() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let source = tmp.path().join("series.csv");
    let rows = (0..1000)
        .map(|i| format!("{},{},{:.3}\n", i, (i * 7919) % 1000, (i as f64 / 10.0).sin()))
        .collect::<String>();
    std::fs::write(&source, format!("t,load,wave\n{}", rows))?;

    let key = Column::int("t");
    let tracked = vec![Column::int("load"), Column::float("wave")];
    let builder = PyramidBuilder::from_options(&BuildOptions {
        workers: Some(4),
        ..BuildOptions::default()
    })?;
    let built = builder.build(&source, &tmp.path().join("cache"), &key, &tracked)?;
    assert_eq!(built.status, BuildStatus::Built);
    assert!(built.is_complete());

    let pyramid = Pyramid::open(&built.dir, key, &tracked)?;
    let mut client = ViewportWorker::new(vec![pyramid], &ViewOptions::default()).spawn()?;
    let id = client.request(Some(100.0), Some(600.0), 50)?;
    match client.recv()? {
        Response::Selected { request_id, result, .. } => {
            assert_eq!(request_id, id);
            assert!(result.level > 0);
            assert!(result.len() >= 50);
            assert!(result.keys.windows(2).all(|w| w[0] < w[1]));
            assert!(result.keys[0] >= Value::Int(0));
            assert!(result.keys[result.len() - 1] <= Value::Int(700));
            let load = result.band("load").unwrap();
            assert!(load.mins.iter().zip(&load.maxs).all(|(lo, hi)| lo <= hi));
        }
        other => panic!("unexpected {:?}", other),
    }
    client.stop()?;
    Ok(())
}
