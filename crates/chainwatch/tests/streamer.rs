mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use common::{eventually, log_at, MockChain};
use tokio::sync::mpsc;

use chainwatch::watch::{Streamer, Watcher};
use chainwatch::{Error, Query, Subscription};

#[tokio::test]
async fn streams_logs_until_stopped() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 100);
    let (log_tx, log_rx) = mpsc::channel(16);
    let (_err_tx, err_rx) = mpsc::channel(1);
    let unsubscribed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&unsubscribed);
    chain.arm_subscription(Subscription::new(log_rx, err_rx, move || {
        flag.store(true, Ordering::SeqCst);
    }));

    let mut streamer = Streamer::new(chain, Query::new());
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    streamer.on_event(Arc::new(move |log| {
        sink.lock().unwrap().push(log.block_number);
    }));
    streamer.watch()?;

    log_tx.send(log_at("mock", 1, 0)).await?;
    log_tx.send(log_at("mock", 2, 0)).await?;

    eventually(|| {
        let received = Arc::clone(&received);
        async move { received.lock().unwrap().len() == 2 }
    })
    .await;

    streamer.stop().await?;
    assert!(unsubscribed.load(Ordering::SeqCst));
    assert_eq!(*received.lock().unwrap(), vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn subscription_errors_are_surfaced() -> anyhow::Result<()> {
    let chain = MockChain::new("mock", 100);
    let (_log_tx, log_rx) = mpsc::channel(16);
    let (err_tx, err_rx) = mpsc::channel(1);
    chain.arm_subscription(Subscription::new(log_rx, err_rx, || {}));

    let mut streamer = Streamer::new(chain, Query::new());
    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_sink = Arc::clone(&errors);
    streamer.on_error(Arc::new(move |err| {
        error_sink.lock().unwrap().push(err.to_string());
    }));
    streamer.watch()?;

    err_tx
        .send(Error::Connection("notification parse failed".into()))
        .await?;

    eventually(|| {
        let errors = Arc::clone(&errors);
        async move { !errors.lock().unwrap().is_empty() }
    })
    .await;

    streamer.stop().await?;
    Ok(())
}

#[tokio::test]
async fn failed_subscribe_is_reported() -> anyhow::Result<()> {
    // nothing armed: subscribe fails
    let chain = MockChain::new("mock", 100);
    let mut streamer = Streamer::new(chain, Query::new());
    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_sink = Arc::clone(&errors);
    streamer.on_error(Arc::new(move |err| {
        error_sink.lock().unwrap().push(err.to_string());
    }));
    streamer.watch()?;

    eventually(|| {
        let errors = Arc::clone(&errors);
        async move { errors.lock().unwrap().len() == 1 }
    })
    .await;

    streamer.stop().await?;
    Ok(())
}
