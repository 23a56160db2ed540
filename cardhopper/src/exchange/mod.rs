// cardhopper/src/exchange/mod.rs

//! Exchange capabilities.
//!
//! An [`Exchanger`] maps a command to a response in one of two shapes: raw
//! bytes ([`Exchanger::exchange`]) or parsed APDUs ([`Exchanger::apdu`]).
//! Implementors provide the raw shape and get the parsed one for free;
//! implementations that naturally work on parsed APDUs implement [`Apduer`]
//! and are lifted with [`ApduExchanger`].

use std::future::Future;

use async_trait::async_trait;

use crate::Result;
use crate::apdu::{Capdu, Rapdu};
use crate::cancel::CancelContext;

pub mod smartcard;

pub use smartcard::{
    RawControlExchanger, RawSmartCard, RawSmartCardControl, RawSmartCardExchanger,
    RawToSmartCardControl, SmartCardControl, SmartCardControlExchanger,
};

/// Raw-bytes exchange with a parsed-APDU shape derived from it.
#[async_trait]
pub trait Exchanger: Send + Sync {
    /// Send `capdu` and return the full response, status word included.
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>>;

    /// Parsed shape. The default serializes `capdu`, calls
    /// [`exchange`](Self::exchange) and parses the reply.
    async fn apdu(&self, ctx: &CancelContext, capdu: &Capdu) -> Result<Rapdu> {
        let raw = capdu.to_bytes()?;
        let reply = self.exchange(ctx, &raw).await?;
        Rapdu::parse(&reply)
    }
}

/// Parsed-APDU exchange.
#[async_trait]
pub trait Apduer: Send + Sync {
    /// Send `capdu` and return the parsed response.
    async fn apdu(&self, ctx: &CancelContext, capdu: &Capdu) -> Result<Rapdu>;
}

#[async_trait]
impl<T: Exchanger + ?Sized> Exchanger for std::sync::Arc<T> {
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        (**self).exchange(ctx, capdu).await
    }

    async fn apdu(&self, ctx: &CancelContext, capdu: &Capdu) -> Result<Rapdu> {
        (**self).apdu(ctx, capdu).await
    }
}

/// Lifts an [`Apduer`] into an [`Exchanger`]: raw commands are parsed before
/// the call and the reply serialized after it. Parsed calls go straight
/// through.
#[derive(Debug, Clone)]
pub struct ApduExchanger<A>(pub A);

#[async_trait]
impl<A: Apduer> Exchanger for ApduExchanger<A> {
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        let parsed = Capdu::parse(capdu)?;
        let rapdu = self.0.apdu(ctx, &parsed).await?;
        Ok(rapdu.to_bytes())
    }

    async fn apdu(&self, ctx: &CancelContext, capdu: &Capdu) -> Result<Rapdu> {
        self.0.apdu(ctx, capdu).await
    }
}

/// Closure-backed [`Exchanger`].
pub struct ExchangerFn<F>(pub F);

impl<F> std::fmt::Debug for ExchangerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ExchangerFn")
    }
}

#[async_trait]
impl<F, Fut> Exchanger for ExchangerFn<F>
where
    F: Fn(CancelContext, Vec<u8>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>>> + Send,
{
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        (self.0)(ctx.clone(), capdu.to_vec()).await
    }
}

/// Closure-backed [`Apduer`]. Wrap in [`ApduExchanger`] for the raw shape.
pub struct ApduerFn<F>(pub F);

impl<F> std::fmt::Debug for ApduerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApduerFn")
    }
}

#[async_trait]
impl<F, Fut> Apduer for ApduerFn<F>
where
    F: Fn(CancelContext, Capdu) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Rapdu>> + Send,
{
    async fn apdu(&self, ctx: &CancelContext, capdu: &Capdu) -> Result<Rapdu> {
        (self.0)(ctx.clone(), capdu.clone()).await
    }
}
