// cardhopper/src/type4/tracer.rs

//! Read-only observers of APDU traffic.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::cancel::CancelContext;
use crate::error::TraceDirection;
use crate::exchange::Exchanger;
use crate::{Error, Result};

/// Observer of the APDU traffic between the reader and the emulated card.
///
/// Tracers get the live buffers to avoid copying every APDU, but must treat
/// them as read-only: a change is detected by checksum and fails the
/// exchange with [`Error::TracerMutated`].
pub trait Tracer: Send + Sync {
    /// Command APDU received from the reader
    fn reader(&self, ctx: &CancelContext, capdu: &mut [u8]);
    /// Response APDU about to be sent back by the tag
    fn tag(&self, ctx: &CancelContext, rapdu: &mut [u8]);
}

/// Call `observe` on `buf` and fail if it changed the contents.
fn observe_checked(
    direction: TraceDirection,
    buf: &mut [u8],
    observe: impl FnOnce(&mut [u8]),
) -> Result<()> {
    let checksum = crc32fast::hash(buf);
    observe(buf);
    if crc32fast::hash(buf) != checksum {
        return Err(Error::TracerMutated(direction));
    }
    Ok(())
}

/// Tracer that observes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn reader(&self, _: &CancelContext, _: &mut [u8]) {}
    fn tag(&self, _: &CancelContext, _: &mut [u8]) {}
}

/// Fans each observation out to every tracer, in order.
#[derive(Default, Clone)]
pub struct MultiTracer(pub Vec<Arc<dyn Tracer>>);

impl MultiTracer {
    /// Fan out to `tracers`.
    pub fn new(tracers: Vec<Arc<dyn Tracer>>) -> Self {
        Self(tracers)
    }
}

impl Tracer for MultiTracer {
    fn reader(&self, ctx: &CancelContext, capdu: &mut [u8]) {
        for t in &self.0 {
            t.reader(ctx, capdu);
        }
    }

    fn tag(&self, ctx: &CancelContext, rapdu: &mut [u8]) {
        for t in &self.0 {
            t.tag(ctx, rapdu);
        }
    }
}

/// Tracer that can be swapped while a session is running. Starts as a
/// [`NoopTracer`].
pub struct DynamicTracer {
    inner: RwLock<Arc<dyn Tracer>>,
}

impl Default for DynamicTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicTracer {
    /// Dynamic tracer starting as a [`NoopTracer`].
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(NoopTracer)),
        }
    }

    /// Swap in `tracer` for subsequent observations.
    pub fn set(&self, tracer: Arc<dyn Tracer>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = tracer;
    }

    fn current(&self) -> Arc<dyn Tracer> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Tracer for DynamicTracer {
    fn reader(&self, ctx: &CancelContext, capdu: &mut [u8]) {
        self.current().reader(ctx, capdu)
    }

    fn tag(&self, ctx: &CancelContext, rapdu: &mut [u8]) {
        self.current().tag(ctx, rapdu)
    }
}

/// Wraps an [`Exchanger`] so every command and response passes through a
/// [`Tracer`] first.
///
/// Order: observe the command, exchange, observe the response. A mutated
/// command skips the exchange; a mutated response discards its result. A
/// failed exchange is not observed.
pub struct TracingExchanger<E> {
    tracer: Arc<dyn Tracer>,
    inner: E,
}

impl<E: Exchanger> TracingExchanger<E> {
    /// Trace every exchange of `inner` with `tracer`.
    pub fn new(tracer: Arc<dyn Tracer>, inner: E) -> Self {
        Self { tracer, inner }
    }
}

#[async_trait]
impl<E: Exchanger> Exchanger for TracingExchanger<E> {
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        let mut capdu = capdu.to_vec();
        observe_checked(TraceDirection::Reader, &mut capdu, |b| {
            self.tracer.reader(ctx, b)
        })?;

        let mut rapdu = self.inner.exchange(ctx, &capdu).await?;

        observe_checked(TraceDirection::Tag, &mut rapdu, |b| self.tracer.tag(ctx, b))?;
        Ok(rapdu)
    }
}
