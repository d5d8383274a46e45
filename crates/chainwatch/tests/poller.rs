mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{eventually, log_at, MockChain};

use chainwatch::watch::{Poller, Watcher, WatcherState};
use chainwatch::{Cursor, Error, MemoryCursor, PollerConfig, Query};

fn slow_config(batch_size: u64, confirmations: u64) -> PollerConfig {
    // One immediate cycle, then effectively nothing.
    PollerConfig {
        interval: Duration::from_secs(60),
        batch_size,
        confirmations,
    }
}

fn fast_config(batch_size: u64, confirmations: u64) -> PollerConfig {
    PollerConfig {
        interval: Duration::from_millis(30),
        batch_size,
        confirmations,
    }
}

#[tokio::test]
async fn resumes_at_cursor_plus_one() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 110);
    for block in 101..=110 {
        chain.push(log_at("mock", block, 0));
    }
    let cursor = Arc::new(MemoryCursor::new());
    cursor.save("mock", 100).await?;

    let mut poller = Poller::new(
        chain.clone(),
        Query::new(),
        cursor.clone(),
        slow_config(5, 0),
    );
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    poller.on_event(Arc::new(move |log| {
        sink.lock().unwrap().push(log.block_number);
    }));
    poller.watch()?;

    // One cycle: [101, 105] fetched, cursor committed to 105.
    eventually(|| {
        let cursor = cursor.clone();
        async move { cursor.load("mock").await.unwrap() == 105 }
    })
    .await;
    assert_eq!(chain.fetch_calls(), vec![(101, 105)]);
    assert_eq!(*received.lock().unwrap(), vec![101, 102, 103, 104, 105]);

    poller.stop().await?;
    assert_eq!(poller.state(), WatcherState::Stopped);
    Ok(())
}

#[tokio::test]
async fn advances_across_cycles_in_order() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 110);
    for block in 101..=110 {
        chain.push(log_at("mock", block, 0));
        chain.push(log_at("mock", block, 1));
    }
    let cursor = Arc::new(MemoryCursor::new());
    cursor.save("mock", 100).await?;

    let mut poller = Poller::new(
        chain.clone(),
        Query::new(),
        cursor.clone(),
        fast_config(5, 0),
    );
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    poller.on_event(Arc::new(move |log| {
        sink.lock().unwrap().push((log.block_number, log.log_index));
    }));
    poller.watch()?;

    eventually(|| {
        let cursor = cursor.clone();
        async move { cursor.load("mock").await.unwrap() == 110 }
    })
    .await;
    poller.stop().await?;

    assert_eq!(chain.fetch_calls()[..2], [(101, 105), (106, 110)]);

    // ascending (block_number, log_index) within and across cycles
    let received = received.lock().unwrap();
    assert_eq!(received.len(), 20);
    assert!(received.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

#[tokio::test]
async fn cold_start_begins_at_safe_head() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 100);
    for block in 80..=100 {
        chain.push(log_at("mock", block, 0));
    }
    let cursor = Arc::new(MemoryCursor::new());

    let mut poller = Poller::new(
        chain.clone(),
        Query::new(),
        cursor.clone(),
        slow_config(50, 10),
    );
    poller.on_event(Arc::new(|_| {}));
    poller.watch()?;

    // from = latest − confirmations = 90; safe head is also 90
    eventually(|| {
        let cursor = cursor.clone();
        async move { cursor.load("mock").await.unwrap() == 90 }
    })
    .await;
    assert_eq!(chain.fetch_calls(), vec![(90, 90)]);

    poller.stop().await?;
    Ok(())
}

#[tokio::test]
async fn caught_up_poller_stays_idle() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 110);
    let cursor = Arc::new(MemoryCursor::new());
    cursor.save("mock", 110).await?;

    let mut poller = Poller::new(
        chain.clone(),
        Query::new(),
        cursor.clone(),
        fast_config(5, 0),
    );
    poller.on_event(Arc::new(|_| {}));
    poller.watch()?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    poller.stop().await?;

    assert!(chain.fetch_calls().is_empty());
    assert_eq!(cursor.load("mock").await?, 110);
    Ok(())
}

#[tokio::test]
async fn waits_for_enough_history() -> anyhow::Result<()> {
    // tip below the confirmation depth: nothing is final yet
    let chain = MockChain::new("mock", 5);
    let cursor = Arc::new(MemoryCursor::new());

    let mut poller = Poller::new(
        chain.clone(),
        Query::new(),
        cursor.clone(),
        fast_config(100, 10),
    );
    poller.on_event(Arc::new(|_| {}));
    poller.watch()?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    poller.stop().await?;

    assert!(chain.fetch_calls().is_empty());
    assert_eq!(cursor.load("mock").await?, 0);
    Ok(())
}

#[tokio::test]
async fn failed_fetch_retries_same_range_next_tick() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 110);
    for block in 101..=105 {
        chain.push(log_at("mock", block, 0));
    }
    chain.fail_next_fetches(1);
    let cursor = Arc::new(MemoryCursor::new());
    cursor.save("mock", 100).await?;

    let mut poller = Poller::new(
        chain.clone(),
        Query::new(),
        cursor.clone(),
        fast_config(5, 0),
    );
    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_sink = Arc::clone(&errors);
    poller.on_event(Arc::new(|_| {}));
    poller.on_error(Arc::new(move |err| {
        error_sink.lock().unwrap().push(err.to_string());
    }));
    poller.watch()?;

    eventually(|| {
        let cursor = cursor.clone();
        async move { cursor.load("mock").await.unwrap() == 105 }
    })
    .await;
    poller.stop().await?;

    // same range fetched again after the injected failure
    assert_eq!(chain.fetch_calls()[..2], [(101, 105), (101, 105)]);
    assert_eq!(errors.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn watcher_state_machine() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 10);
    let cursor = Arc::new(MemoryCursor::new());
    let mut poller = Poller::new(chain, Query::new(), cursor, slow_config(5, 0));

    assert_eq!(poller.state(), WatcherState::Idle);
    assert!(matches!(poller.stop().await, Err(Error::NotRunning(_))));

    poller.watch()?;
    assert_eq!(poller.state(), WatcherState::Running);
    assert!(matches!(poller.watch(), Err(Error::AlreadyRunning(_))));

    poller.stop().await?;
    assert_eq!(poller.state(), WatcherState::Stopped);
    // stopping again is a no-op, restarting is refused
    poller.stop().await?;
    assert!(matches!(poller.watch(), Err(Error::NotRunning(_))));
    Ok(())
}
