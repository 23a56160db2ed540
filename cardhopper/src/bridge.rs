// cardhopper/src/bridge.rs

//! Make blocking calls cancellable.
//!
//! [`run_cancellable`] runs a blocking, non-cancellable function (typically a
//! native smart-card call) on tokio's blocking pool and waits for either its
//! result or the cancellation of the governing [`CancelContext`].
//!
//! Cancellation only stops the *waiting*. The blocking function keeps running
//! to completion on its own thread and its result is dropped; there is no way
//! to interrupt a native call that offers no cancellation hook.

use crate::cancel::CancelContext;
use crate::{Error, Result};

/// Run `f` on the blocking pool, returning early with the cancellation cause
/// if `ctx` is cancelled first.
///
/// If `ctx` is already cancelled `f` is never invoked.
pub async fn run_cancellable<T, F>(ctx: &CancelContext, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(CancelContext) -> Result<T> + Send + 'static,
{
    ctx.check()?;

    // The join handle is the only slot the blocking task writes its result
    // to. Dropping it on cancellation detaches the task.
    let task_ctx = ctx.clone();
    let handle = tokio::task::spawn_blocking(move || f(task_ctx));

    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ctx.err()),
        joined = handle => match joined {
            Ok(res) => res,
            Err(e) => Err(Error::TaskFailed(e.to_string())),
        },
    }
}
