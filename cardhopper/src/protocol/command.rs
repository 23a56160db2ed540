// cardhopper/src/protocol/command.rs

//! Proxmark3 host command encoding.

use crate::constants::{PM3_CMD_STANDALONE, PM3_POSTAMBLE_MAGIC, PM3_PREAMBLE_MAGIC};

/// Proxmark3 host command, used once to switch the device into CardHopper
/// standalone mode.
/// Format (little-endian): [Magic "PM3a"(4)] [Len|NG(2)] [Cmd(2)] [Data(n)] [Magic "a3"(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    /// Set for "new generation" framed commands
    pub ng: bool,
    /// Command code
    pub code: u16,
    /// Command payload
    pub data: &'a [u8],
}

impl Command<'static> {
    /// `CMD_STANDALONE` with argument 1, which starts CardHopper.
    pub const ENTER_STANDALONE: Self = Self {
        ng: true,
        code: PM3_CMD_STANDALONE,
        data: &[0x01],
    };
}

impl Command<'_> {
    /// Wire encoding of the command.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 2 + 2 + self.data.len() + 2);
        out.extend_from_slice(&PM3_PREAMBLE_MAGIC.to_le_bytes());

        let mut len_ng = (self.data.len() & 0x7FFF) as u16;
        if self.ng {
            len_ng |= 1 << 15;
        }
        out.extend_from_slice(&len_ng.to_le_bytes());
        out.extend_from_slice(&self.code.to_le_bytes());
        out.extend_from_slice(self.data);
        out.extend_from_slice(&PM3_POSTAMBLE_MAGIC.to_le_bytes());
        out
    }
}
