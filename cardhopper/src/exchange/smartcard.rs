// cardhopper/src/exchange/smartcard.rs

//! Adapters from blocking smart-card primitives to [`Exchanger`].
//!
//! The raw traits mirror what native PC/SC bindings expose: a blocking
//! `transmit` and a blocking, platform-specific `control` ioctl. Every adapter
//! runs the blocking call through [`run_cancellable`], so callers can stop
//! waiting on a stuck reader although the native call itself keeps running.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::bridge::run_cancellable;
use crate::cancel::CancelContext;
use crate::exchange::Exchanger;

/// Blocking APDU transmit, e.g. a PC/SC card handle.
pub trait RawSmartCard: Send + Sync + 'static {
    /// Send one command APDU and wait for the response.
    fn transmit(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Blocking control transfer addressed by a platform ioctl.
pub trait RawSmartCardControl: Send + Sync + 'static {
    /// Issue control `ioctl` with `data`.
    fn control(&self, ioctl: u32, data: &[u8]) -> Result<Vec<u8>>;
}

/// Cancellable control transfer addressed by a portable control code.
#[async_trait]
pub trait SmartCardControl: Send + Sync {
    /// Issue control `code` with `data`, giving up once `ctx` is cancelled.
    async fn control(&self, ctx: &CancelContext, code: u16, data: &[u8]) -> Result<Vec<u8>>;
}

/// [`RawSmartCard::transmit`] as an [`Exchanger`].
pub struct RawSmartCardExchanger<T: ?Sized> {
    card: Arc<T>,
}

impl<T: RawSmartCard + ?Sized> RawSmartCardExchanger<T> {
    /// Adapter over `card`.
    pub fn new(card: Arc<T>) -> Self {
        Self { card }
    }
}

#[async_trait]
impl<T: RawSmartCard + ?Sized> Exchanger for RawSmartCardExchanger<T> {
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        let card = self.card.clone();
        let capdu = capdu.to_vec();
        run_cancellable(ctx, move |_| card.transmit(&capdu)).await
    }
}

/// Escape commands sent with a fixed ioctl, as an [`Exchanger`].
pub struct RawControlExchanger<T: ?Sized> {
    card: Arc<T>,
    ioctl: u32,
}

impl<T: RawSmartCardControl + ?Sized> RawControlExchanger<T> {
    /// Adapter sending every APDU through `ioctl`.
    pub fn new(card: Arc<T>, ioctl: u32) -> Self {
        Self { card, ioctl }
    }
}

#[async_trait]
impl<T: RawSmartCardControl + ?Sized> Exchanger for RawControlExchanger<T> {
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        let card = self.card.clone();
        let ioctl = self.ioctl;
        let capdu = capdu.to_vec();
        run_cancellable(ctx, move |_| card.control(ioctl, &capdu)).await
    }
}

/// [`RawSmartCardControl`] lifted to a [`SmartCardControl`] using a
/// caller-supplied mapping from portable control codes to platform ioctls.
pub struct RawToSmartCardControl<T: ?Sized, F> {
    card: Arc<T>,
    code_to_ioctl: F,
}

impl<T, F> RawToSmartCardControl<T, F>
where
    T: RawSmartCardControl + ?Sized,
    F: Fn(u16) -> u32 + Send + Sync,
{
    /// Adapter mapping portable codes with `code_to_ioctl`.
    pub fn new(card: Arc<T>, code_to_ioctl: F) -> Self {
        Self {
            card,
            code_to_ioctl,
        }
    }
}

#[async_trait]
impl<T, F> SmartCardControl for RawToSmartCardControl<T, F>
where
    T: RawSmartCardControl + ?Sized,
    F: Fn(u16) -> u32 + Send + Sync,
{
    async fn control(&self, ctx: &CancelContext, code: u16, data: &[u8]) -> Result<Vec<u8>> {
        let card = self.card.clone();
        let ioctl = (self.code_to_ioctl)(code);
        let data = data.to_vec();
        run_cancellable(ctx, move |_| card.control(ioctl, &data)).await
    }
}

/// Control transfers with a fixed code, as an [`Exchanger`].
pub struct SmartCardControlExchanger<C> {
    control: C,
    code: u16,
}

impl<C: SmartCardControl> SmartCardControlExchanger<C> {
    /// Adapter sending every APDU as control `code`.
    pub fn new(control: C, code: u16) -> Self {
        Self { control, code }
    }
}

#[async_trait]
impl<C: SmartCardControl> Exchanger for SmartCardControlExchanger<C> {
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        self.control.control(ctx, self.code, capdu).await
    }
}
