// cardhopper/src/protocol/block.rs

//! ISO14443-4 block header decoding (card side).

use crate::constants::*;
use crate::{Error, Result};

/// ISO14443-4 block kind, from the top PCB bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// Information block
    I,
    /// Receive-ready (ACK/NAK) block
    R,
    /// Supervisory block
    S,
}

/// Decoded view of the PCB and the optional CID/NAD bytes that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Raw protocol control byte
    pub pcb: u8,
    /// Block kind
    pub block_type: BlockType,
    /// Chaining on I-blocks, NAK on R-blocks
    pub chaining: bool,
    /// CID byte present
    pub has_cid: bool,
    /// NAD byte present
    pub has_nad: bool,
    /// Block number bit
    pub block_number: u8,
    /// CID, when flagged and present
    pub cid: Option<u8>,
    /// NAD, when flagged and present
    pub nad: Option<u8>,
}

impl BlockHeader {
    /// Decode the header of `block`. Fails on an empty block or a bad PCB.
    pub fn parse(block: &[u8]) -> Result<Self> {
        let pcb = *block
            .first()
            .ok_or_else(|| Error::MalformedBlock("empty block".into()))?;

        let block_type = match pcb & PCB_TYPE_MASK {
            PCB_TYPE_I => BlockType::I,
            PCB_TYPE_R => BlockType::R,
            PCB_TYPE_S => BlockType::S,
            _ => return Err(Error::MalformedBlock(format!("bad PCB {:#04x}", pcb))),
        };

        let has_cid = pcb & PCB_CID != 0;
        let has_nad = pcb & PCB_NAD != 0;

        let cid = if has_cid {
            block.get(1).map(|b| b & 0x0F)
        } else {
            None
        };
        let nad = if has_nad {
            block.get(1 + has_cid as usize).copied()
        } else {
            None
        };

        Ok(Self {
            pcb,
            block_type,
            chaining: pcb & PCB_CHAINING != 0,
            has_cid,
            has_nad,
            block_number: pcb & PCB_BLOCK_NUMBER,
            cid,
            nad,
        })
    }

    /// PCB plus the CID and NAD bytes, when flagged.
    pub fn len(&self) -> usize {
        1 + self.has_nad as usize + self.has_cid as usize
    }

    /// R(NAK) block.
    pub fn is_nak(&self) -> bool {
        self.block_type == BlockType::R && self.pcb & PCB_NAK != 0
    }

    /// S(DESELECT) block.
    pub fn is_deselect(&self) -> bool {
        self.block_type == BlockType::S && self.pcb & PCB_S_KIND_MASK == 0
    }

    /// Reserved bits hold their fixed values for this block type.
    pub fn has_expected_bits(&self) -> bool {
        match self.block_type {
            BlockType::I => self.pcb & 0xE2 == 0x02,
            BlockType::R => self.pcb & 0xE6 == 0xA2,
            BlockType::S => self.pcb & 0xC7 == 0xC2,
        }
    }
}

/// Parameters of a RATS frame (`E0 xx`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rats {
    /// Card identifier assigned by the reader
    pub cid: u8,
    /// Frame size for proximity coupling device integer
    pub fsdi: u8,
}

impl Rats {
    /// `None` unless `block` is exactly a two-byte RATS.
    pub fn parse(block: &[u8]) -> Option<Self> {
        match block {
            [RATS, param] => Some(Self {
                cid: param & 0x0F,
                fsdi: (param & 0xF0) >> 4,
            }),
            _ => None,
        }
    }
}
