// cardhopper/src/cardhopper/builder.rs

//! Step-by-step construction of a [`CardHopper`](super::CardHopper).

use crate::cardhopper::{CardHopper, SessionConfig};
use crate::transport::Transport;
use crate::type4::EmulatedCard;
use crate::{Error, Result};

/// Helper to construct a [`CardHopper`] with optional configuration.
pub struct CardHopperBuilder<T> {
    transport: Option<T>,
    card: Option<EmulatedCard>,
    config: SessionConfig,
}

impl<T: Transport> Default for CardHopperBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> CardHopperBuilder<T> {
    /// Builder with the default session timing.
    pub fn new() -> Self {
        Self {
            transport: None,
            card: None,
            config: SessionConfig::default(),
        }
    }

    /// Byte stream to the relay (serial port, TCP bridge, MockTransport)
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Card to emulate. Required.
    pub fn with_card(mut self, card: EmulatedCard) -> Self {
        self.card = Some(card);
        self
    }

    /// Session timing and port handling.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Requires a transport and a card; otherwise returns MissingComponent.
    pub fn build(self) -> Result<CardHopper<T>> {
        let transport = self
            .transport
            .ok_or(Error::MissingComponent("transport"))?;
        let card = self.card.ok_or(Error::MissingComponent("card"))?;
        Ok(CardHopper::new(transport, card).with_config(self.config))
    }
}
