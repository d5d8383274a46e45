mod common;

use std::sync::{Arc, Mutex};

use common::{eventually, log_at, MockChain};

use chainwatch::watch::{Replay, Watcher};
use chainwatch::Query;

#[tokio::test]
async fn replays_full_range_in_batches() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 100);
    for block in 1..=10 {
        chain.push(log_at("mock", block, 0));
    }

    let query = Query::new().block_range(1, 10);
    let mut replay = Replay::new(chain.clone(), query, 3);
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    replay.on_event(Arc::new(move |log| {
        sink.lock().unwrap().push(log.block_number);
    }));
    replay.watch()?;

    eventually(|| {
        let received = Arc::clone(&received);
        async move { received.lock().unwrap().len() == 10 }
    })
    .await;

    assert_eq!(
        chain.fetch_calls(),
        vec![(1, 3), (4, 6), (7, 9), (10, 10)]
    );
    assert_eq!(*received.lock().unwrap(), (1..=10).collect::<Vec<u64>>());

    replay.stop().await?;
    Ok(())
}

#[tokio::test]
async fn failed_batch_is_reported_and_skipped() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 100);
    for block in 1..=6 {
        chain.push(log_at("mock", block, 0));
    }
    chain.fail_next_fetches(1);

    let query = Query::new().block_range(1, 6);
    let mut replay = Replay::new(chain.clone(), query, 3);
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_sink = Arc::clone(&errors);
    replay.on_event(Arc::new(move |log| {
        sink.lock().unwrap().push(log.block_number);
    }));
    replay.on_error(Arc::new(move |err| {
        error_sink.lock().unwrap().push(err.to_string());
    }));
    replay.watch()?;

    // first batch [1, 3] fails; the scan continues with [4, 6]
    eventually(|| {
        let received = Arc::clone(&received);
        async move { received.lock().unwrap().len() == 3 }
    })
    .await;

    assert_eq!(chain.fetch_calls(), vec![(1, 3), (4, 6)]);
    assert_eq!(*received.lock().unwrap(), vec![4, 5, 6]);
    assert_eq!(errors.lock().unwrap().len(), 1);

    replay.stop().await?;
    Ok(())
}

#[tokio::test]
async fn unbounded_query_is_rejected() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 100);
    let mut replay = Replay::new(chain.clone(), Query::new().from_block(1), 3);
    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_sink = Arc::clone(&errors);
    replay.on_error(Arc::new(move |err| {
        error_sink.lock().unwrap().push(err.to_string());
    }));
    replay.watch()?;

    eventually(|| {
        let errors = Arc::clone(&errors);
        async move { errors.lock().unwrap().len() == 1 }
    })
    .await;
    assert!(chain.fetch_calls().is_empty());

    replay.stop().await?;
    Ok(())
}

#[tokio::test]
async fn zero_batch_size_uses_default() {
    let chain = MockChain::new("mock", 100);
    chain.push(log_at("mock", 5, 0));

    let mut replay = Replay::new(chain.clone(), Query::new().block_range(1, 10), 0);
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    replay.on_event(Arc::new(move |log| {
        sink.lock().unwrap().push(log.block_number);
    }));
    replay.watch().unwrap();

    eventually(|| {
        let received = Arc::clone(&received);
        async move { received.lock().unwrap().len() == 1 }
    })
    .await;

    // the whole range fits one default-sized batch
    assert_eq!(chain.fetch_calls(), vec![(1, 10)]);
}
