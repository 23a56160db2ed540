use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cardhopper::Error;
use cardhopper::bridge::run_cancellable;
use cardhopper::cancel::{CancelContext, Cause};

#[tokio::test]
async fn deadline_abandons_slow_call() {
    let ctx = CancelContext::new().with_timeout(Duration::from_millis(50));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let start = Instant::now();
    let res = run_cancellable(&ctx, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    })
    .await;

    assert!(matches!(res, Err(Error::Cancelled(Cause::DeadlineExceeded))));
    assert!(start.elapsed() < Duration::from_millis(300));
    // Never invoked more than once, whether or not it got to start.
    assert!(calls.load(Ordering::SeqCst) <= 1);
}

#[tokio::test]
async fn blocking_call_sees_its_context() -> anyhow::Result<()> {
    let parent = CancelContext::new();
    let child = parent.child();

    let was_cancelled = run_cancellable(&child, |ctx| Ok(ctx.is_cancelled())).await?;
    assert!(!was_cancelled);

    parent.cancel_with_cause(Cause::Custom("reader removed".into()));
    let res = run_cancellable(&child, |_| Ok(())).await;
    assert!(matches!(res, Err(Error::Cancelled(Cause::Custom(c))) if c == "reader removed"));
    Ok(())
}
