// cardhopper/src/protocol/packet.rs

//! Length-prefixed relay packets.

use derive_more::Deref;

use crate::constants::MAX_PACKET_LEN;
use crate::{Error, Result};

/// Magic payloads understood by the CardHopper firmware
pub const MAGIC_READ: &[u8] = b"READ";
/// Switch the relay to card emulation
pub const MAGIC_CARD: &[u8] = b"CARD";
/// Leave the current mode and wait for a new one
pub const MAGIC_RESTART: &[u8] = b"RESTART";
/// Leave standalone mode
pub const MAGIC_END: &[u8] = b"\xFFEND";
/// Error marker sent by the firmware
pub const MAGIC_ERR: &[u8] = b"\xFFERR";

/// Relay packet payload. Wire format: [Len(1)] [Payload(Len)]
///
/// The buffer is meant to be reused across reads and writes; it never
/// holds more than 255 bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deref)]
pub struct Packet(Vec<u8>);

impl Packet {
    /// Empty packet with room for the largest payload.
    pub fn new() -> Self {
        Self(Vec::with_capacity(MAX_PACKET_LEN))
    }

    /// Packet holding a copy of `payload`. Fails above 255 bytes.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let mut p = Self::new();
        p.write(payload)?;
        Ok(p)
    }

    /// One-byte packet, e.g. a bare PCB.
    pub fn from_byte(b: u8) -> Self {
        let mut p = Self::new();
        p.0.push(b);
        p
    }

    /// Append bytes, failing if the packet would exceed 255 bytes.
    pub fn write(&mut self, b: &[u8]) -> Result<usize> {
        check_len(self.0.len() + b.len())?;
        self.0.extend_from_slice(b);
        Ok(b.len())
    }

    /// Replace the contents with `b`.
    pub fn set(&mut self, b: &[u8]) -> Result<()> {
        check_len(b.len())?;
        self.0.clear();
        self.0.extend_from_slice(b);
        Ok(())
    }

    /// Shorten the packet to `n` bytes.
    ///
    /// # Panics
    /// If `n` is greater than the current length.
    pub fn truncate(&mut self, n: usize) {
        assert!(n <= self.0.len(), "Packet: truncation out of range");
        self.0.truncate(n);
    }

    /// Empty the packet, keeping its allocation.
    pub fn reset(&mut self) {
        self.0.clear();
    }

    /// Payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload bytes, mutably. The length cannot change through this.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Length-prefixed wire form
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.0.len());
        out.push(self.0.len() as u8);
        out.extend_from_slice(&self.0);
        out
    }

    /// Resize to exactly `len` zeroed bytes ready to be filled by a read.
    pub(crate) fn prepare_read(&mut self, len: u8) -> &mut [u8] {
        self.0.clear();
        self.0.resize(len as usize, 0);
        &mut self.0
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = Error;

    fn try_from(b: &[u8]) -> Result<Self> {
        Self::from_slice(b)
    }
}

impl TryFrom<Vec<u8>> for Packet {
    type Error = Error;

    fn try_from(v: Vec<u8>) -> Result<Self> {
        check_len(v.len())?;
        Ok(Self(v))
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<[u8]> for Packet {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

fn check_len(len: usize) -> Result<()> {
    if len > MAX_PACKET_LEN {
        return Err(Error::PacketTooBig {
            len,
            max: MAX_PACKET_LEN,
        });
    }
    Ok(())
}

/// Encode a payload into its length-prefixed wire form.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>> {
    check_len(payload.len())?;
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(payload.len() as u8);
    out.extend_from_slice(payload);
    Ok(out)
}
