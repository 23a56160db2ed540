// cardhopper/src/type4/mod.rs

//! ISO14443-4 (Type 4) card emulation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::cancel::CancelContext;
use crate::exchange::Exchanger;
use crate::types::CardIdentity;

pub mod emulator;
pub mod tracer;

pub use emulator::{SessionState, Step, Type4Emulator};
pub use tracer::{DynamicTracer, MultiTracer, NoopTracer, Tracer, TracingExchanger};

/// Application that answers command APDUs on behalf of the emulated card.
#[async_trait]
pub trait Handler: Exchanger {
    /// Called when the reader deselects the card.
    async fn reset(&self, ctx: &CancelContext);
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
    async fn reset(&self, ctx: &CancelContext) {
        (**self).reset(ctx).await
    }
}

/// The card presented to the reader: its identity, the application
/// handler, and an optional tracer checked for read-only use.
pub struct EmulatedCard {
    identity: CardIdentity,
    handler: Arc<dyn Handler>,
    traced: Option<TracingExchanger<Arc<dyn Handler>>>,
}

impl EmulatedCard {
    /// Card answering with `handler` and no tracer.
    pub fn new(identity: CardIdentity, handler: Arc<dyn Handler>) -> Self {
        Self {
            identity,
            handler,
            traced: None,
        }
    }

    /// Route every exchange through `tracer`, replacing any previous one.
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.traced = Some(TracingExchanger::new(tracer, self.handler.clone()));
        self
    }

    /// UID and ATS announced to the relay.
    pub fn identity(&self) -> &CardIdentity {
        &self.identity
    }
}

#[async_trait]
impl Exchanger for EmulatedCard {
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        match &self.traced {
            Some(traced) => traced.exchange(ctx, capdu).await,
            None => self.handler.exchange(ctx, capdu).await,
        }
    }
}

#[async_trait]
impl Handler for EmulatedCard {
    async fn reset(&self, ctx: &CancelContext) {
        self.handler.reset(ctx).await
    }
}
