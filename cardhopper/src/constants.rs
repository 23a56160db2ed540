// cardhopper/src/constants.rs
//! Common protocol constants used across the crate

/// Maximum payload length of a relay packet (one length byte on the wire)
pub const MAX_PACKET_LEN: usize = 255;

/// Acknowledgement byte the relay sends after each packet
pub const ACK_BYTE: u8 = 0xFE;

/// Pause before polling the relay again after a read returned nothing
pub const READ_RETRY_MS: u64 = 1;

/// Proxmark3 command preamble "PM3a", little-endian on the wire
pub const PM3_PREAMBLE_MAGIC: u32 = 0x6133_4D50;

/// Proxmark3 command postamble "a3", little-endian on the wire
pub const PM3_POSTAMBLE_MAGIC: u16 = 0x3361;

/// Proxmark3 command code that enters the standalone mode (CardHopper)
pub const PM3_CMD_STANDALONE: u16 = 0x0115;

/// RATS start byte
pub const RATS: u8 = 0xE0;

/// ISO14443-4 PCB block type mask and values
pub const PCB_TYPE_MASK: u8 = 0xC0;
/// I-block type value
pub const PCB_TYPE_I: u8 = 0x00;
/// R-block type value
pub const PCB_TYPE_R: u8 = 0x80;
/// S-block type value
pub const PCB_TYPE_S: u8 = 0xC0;

/// ISO14443-4 PCB flag bits
pub const PCB_BLOCK_NUMBER: u8 = 0x01;
/// NAD byte follows the PCB (and CID)
pub const PCB_NAD: u8 = 0x04;
/// CID byte follows the PCB
pub const PCB_CID: u8 = 0x08;
/// Chaining bit on I-blocks, NAK bit on R-blocks
pub const PCB_CHAINING: u8 = 0x10;
/// NAK bit on R-blocks
pub const PCB_NAK: u8 = 0x10;
/// S-block sub-type bits (00 = DESELECT, 11 = WTX)
pub const PCB_S_KIND_MASK: u8 = 0x30;

/// R(ACK) base pattern
pub const PCB_R_ACK: u8 = 0xA2;

/// Status word sent when the APDU handler fails: 6F00 internal exception
pub const SW_INTERNAL_EXCEPTION: [u8; 2] = [0x6F, 0x00];
// cardhopper/src/constants.rs
