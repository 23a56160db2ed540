// cardhopper/src/cardhopper/mod.rs

//! Card emulation through a Proxmark3 running the CardHopper standalone
//! mode.
//!
//! The relay forwards ISO14443-4 blocks from the reader as length-prefixed
//! packets and sends back whatever block we answer with. A session is
//! configured once with [`CardHopper::setup`], then driven by
//! [`CardHopper::emulate`] until cancelled.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::Result;
use crate::cancel::CancelContext;
use crate::protocol::{Command, MAGIC_CARD, MAGIC_END, MAGIC_RESTART, PacketChannel};
use crate::transport::{Acker, Transport};
use crate::type4::{EmulatedCard, Type4Emulator};

pub mod builder;
pub mod config;

pub use builder::CardHopperBuilder;
pub use config::SessionConfig;

/// Emulation session over a CardHopper relay.
pub struct CardHopper<T = Box<dyn Transport>> {
    channel: PacketChannel<Acker<T>>,
    card: Arc<EmulatedCard>,
    emulator: Type4Emulator,
    config: SessionConfig,
}

impl<T: Transport> CardHopper<T> {
    /// Session emulating `card` over `transport`, with local acknowledgements
    /// and the default timing.
    pub fn new(transport: T, card: EmulatedCard) -> Self {
        let card = Arc::new(card);
        Self {
            channel: PacketChannel::with_local_ack(transport),
            emulator: Type4Emulator::new(card.clone()),
            card,
            config: SessionConfig::default(),
        }
    }

    /// Replace the session timing.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Session timing in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The emulated card.
    pub fn card(&self) -> &EmulatedCard {
        &self.card
    }

    /// Block-level emulator, e.g. to inspect its state.
    pub fn emulator(&self) -> &Type4Emulator {
        &self.emulator
    }

    /// Packet channel to the relay.
    pub fn channel(&self) -> &PacketChannel<Acker<T>> {
        &self.channel
    }

    /// Give back the transport, e.g. to reuse the port after [`close`](Self::close).
    pub fn into_inner(self) -> T {
        self.channel.into_inner().into_inner()
    }

    /// Switch the Proxmark into CardHopper standalone mode and configure
    /// the relay with the card's UID and ATS.
    ///
    /// Any write failure aborts setup with that error. Every wait, writes
    /// included, gives up once `ctx` is cancelled.
    pub async fn setup(&mut self, ctx: &CancelContext) -> Result<()> {
        ctx.check()?;

        if self.config.reset_input {
            debug!("resetting port input buffer");
            ctx.run(self.channel.reset_input()).await?;
        }

        debug!("entering standalone mode");
        ctx.run(self.channel.write_raw(&Command::ENTER_STANDALONE.to_bytes()))
            .await?;
        settle(ctx, self.config.standalone_settle).await?;

        let identity = self.card.identity();
        let blocks: [(&str, &[u8]); 5] = [
            ("card mode", MAGIC_CARD),
            ("tag type", &[config::TAG_TYPE]),
            ("timing modes", &[config::FWI, config::SFGI]),
            ("uid", identity.uid.as_slice()),
            ("ats", identity.ats.as_slice()),
        ];

        for (i, (what, payload)) in blocks.into_iter().enumerate() {
            if i > 0 {
                settle(ctx, self.config.block_settle).await?;
            }
            debug!("sending {}", what);
            ctx.run(self.channel.write_with_ack(payload)).await?;
        }

        Ok(())
    }

    /// Answer reader blocks until `ctx` is cancelled or the relay link
    /// fails.
    pub async fn emulate(&mut self, ctx: &CancelContext) -> Result<()> {
        self.emulator.run(ctx, &mut self.channel).await
    }

    /// [`setup`](Self::setup) followed by [`emulate`](Self::emulate).
    pub async fn run(&mut self, ctx: &CancelContext) -> Result<()> {
        self.setup(ctx).await?;
        self.emulate(ctx).await
    }

    /// Put the relay back into its idle state. Best effort: errors are
    /// ignored.
    pub async fn close(&mut self) {
        debug!("closing cardhopper session");
        let _ = self.channel.write_ignoring_ack(MAGIC_RESTART).await;
        tokio::time::sleep(self.config.teardown_delay).await;
        let _ = self.channel.write_ignoring_ack(MAGIC_RESTART).await;
        tokio::time::sleep(self.config.teardown_delay).await;
        let _ = self.channel.write_ignoring_ack(MAGIC_END).await;
    }
}

async fn settle(ctx: &CancelContext, delay: Duration) -> Result<()> {
    if delay.is_zero() {
        return ctx.check();
    }
    ctx.run(async {
        tokio::time::sleep(delay).await;
        Ok(())
    })
    .await
}
