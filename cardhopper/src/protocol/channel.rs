// cardhopper/src/protocol/channel.rs

//! Packet I/O with the CardHopper relay.

use std::time::Duration;

use log::trace;

use crate::constants::{ACK_BYTE, READ_RETRY_MS};
use crate::protocol::packet::{Packet, encode};
use crate::transport::{Acker, Transport};
use crate::utils::LogHex;
use crate::{Error, Result};

/// Length-prefixed packet framing over a [`Transport`], with per-write
/// acknowledgement.
#[derive(Debug)]
pub struct PacketChannel<T = Box<dyn Transport>> {
    transport: T,
}

impl<T: Transport> PacketChannel<T> {
    /// Channel over `transport`. Acknowledgements are read from it.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Write unframed bytes, e.g. a Proxmark3 [`Command`](crate::protocol::Command).
    pub async fn write_raw(&mut self, bytes: &[u8]) -> Result<usize> {
        self.transport.send(bytes).await?;
        Ok(bytes.len())
    }

    /// Write a framed packet without waiting for the acknowledgement.
    /// Returns the number of bytes put on the wire.
    pub async fn write_ignoring_ack(&mut self, payload: &[u8]) -> Result<usize> {
        let wire = encode(payload)?;
        trace!("writing packet {}", LogHex(payload));
        self.transport.send(&wire).await?;
        Ok(wire.len())
    }

    /// Write a framed packet and require the relay's `0xFE` acknowledgement.
    pub async fn write_with_ack(&mut self, payload: &[u8]) -> Result<usize> {
        let n = self.write_ignoring_ack(payload).await?;

        let mut ack = [0u8; 1];
        match self.transport.receive(&mut ack).await {
            Ok(0) => return Err(Error::MissingAck),
            Err(e) if e.is_eof() => return Err(Error::MissingAck),
            Err(e) => return Err(e),
            Ok(_) => {}
        }
        if ack[0] != ACK_BYTE {
            return Err(Error::BadAck(ack[0]));
        }

        Ok(n)
    }

    /// Read one packet into `packet`, reusing its allocation.
    ///
    /// Returns the number of bytes consumed from the stream. `Ok(0)` means
    /// nothing was available, or the stream is closed, and `packet` is left
    /// untouched; `Ok(1)` with an empty `packet` is a genuine zero-length
    /// packet.
    ///
    /// Once the length byte is in, empty reads are retried until the packet
    /// completes, so callers bound the wait by racing a cancellation. A
    /// stream that closes mid-packet fails with [`Error::TruncatedRead`].
    pub async fn read_packet(&mut self, packet: &mut Packet) -> Result<usize> {
        let mut len = [0u8; 1];
        match self.transport.receive(&mut len).await {
            Ok(0) => return Ok(0),
            Err(e) if e.is_eof() => return Ok(0),
            Err(e) => return Err(e),
            Ok(_) => {}
        }

        let expected = len[0] as usize;
        let buf = packet.prepare_read(len[0]);
        let mut filled = 0;
        while filled < expected {
            match self.transport.receive(&mut buf[filled..]).await {
                Ok(0) => tokio::time::sleep(Duration::from_millis(READ_RETRY_MS)).await,
                Ok(n) => filled += n,
                Err(e) if e.is_eof() => {
                    packet.reset();
                    return Err(Error::TruncatedRead {
                        expected,
                        actual: filled,
                    });
                }
                Err(e) => {
                    packet.reset();
                    return Err(e);
                }
            }
        }

        trace!("read packet {}", LogHex(packet.as_bytes()));
        Ok(1 + expected)
    }

    /// Read one packet into a fresh buffer. An empty packet is returned
    /// when nothing was available.
    pub async fn read(&mut self) -> Result<Packet> {
        let mut packet = Packet::new();
        self.read_packet(&mut packet).await?;
        Ok(packet)
    }

    /// Drop input buffered by the transport.
    pub async fn reset_input(&mut self) -> Result<()> {
        self.transport.reset_input_buffer().await
    }
}

impl<T: Transport> PacketChannel<Acker<T>> {
    /// Channel whose acknowledgements are synthesized locally, as the
    /// CardHopper firmware expects.
    pub fn with_local_ack(transport: T) -> Self {
        Self::new(Acker::new(transport))
    }
}
