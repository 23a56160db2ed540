// cardhopper/src/apdu.rs

//! ISO/IEC 7816-4 command and response APDUs.
//!
//! Only the framing is modelled: header bytes, the command data field and the
//! expected response length (Ne) for commands; the data field and status word
//! for responses. Both short and extended length encodings are accepted.

use crate::{Error, Result};

const MAX_SHORT_NC: usize = 255;
const MAX_SHORT_NE: usize = 256;
const MAX_EXTENDED_NC: usize = 65535;
const MAX_EXTENDED_NE: usize = 65536;

/// Command APDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capdu {
    /// Class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (Lc is derived from its length)
    pub data: Vec<u8>,
    /// Expected response length. Zero means no Le field.
    pub ne: usize,
}

impl Capdu {
    /// Case 1 command: header only.
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            ne: 0,
        }
    }

    /// Attach command data.
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the expected response length.
    pub fn with_ne(mut self, ne: usize) -> Self {
        self.ne = ne;
        self
    }

    fn is_extended(&self) -> bool {
        self.data.len() > MAX_SHORT_NC || self.ne > MAX_SHORT_NE
    }

    /// Serialize, choosing short encoding whenever the lengths allow it.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.data.len() > MAX_EXTENDED_NC {
            return Err(Error::InvalidApdu(format!(
                "command data too long: {} bytes",
                self.data.len()
            )));
        }
        if self.ne > MAX_EXTENDED_NE {
            return Err(Error::InvalidApdu(format!("ne too large: {}", self.ne)));
        }

        let mut out = Vec::with_capacity(4 + 3 + self.data.len() + 3);
        out.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2]);

        if self.is_extended() {
            out.push(0x00);
            if !self.data.is_empty() {
                out.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
                out.extend_from_slice(&self.data);
            }
            if self.ne > 0 {
                // 65536 wraps to 0x0000
                out.extend_from_slice(&((self.ne & 0xFFFF) as u16).to_be_bytes());
            }
        } else {
            if !self.data.is_empty() {
                out.push(self.data.len() as u8);
                out.extend_from_slice(&self.data);
            }
            if self.ne > 0 {
                out.push((self.ne & 0xFF) as u8);
            }
        }

        Ok(out)
    }

    /// Parse short or extended encoding.
    pub fn parse(b: &[u8]) -> Result<Self> {
        if b.len() < 4 {
            return Err(Error::InvalidApdu(format!(
                "command too short: {} bytes",
                b.len()
            )));
        }
        let mut capdu = Capdu::new(b[0], b[1], b[2], b[3]);
        let body = &b[4..];

        match body.len() {
            // Case 1
            0 => {}
            // Case 2S
            1 => capdu.ne = short_ne(body[0]),
            _ if body[0] != 0 => {
                let nc = body[0] as usize;
                match body.len() - 1 {
                    // Case 3S
                    n if n == nc => capdu.data = body[1..].to_vec(),
                    // Case 4S
                    n if n == nc + 1 => {
                        capdu.data = body[1..1 + nc].to_vec();
                        capdu.ne = short_ne(body[1 + nc]);
                    }
                    n => {
                        return Err(Error::InvalidApdu(format!(
                            "lc {} does not match body length {}",
                            nc, n
                        )));
                    }
                }
            }
            // Case 2E
            3 => capdu.ne = extended_ne(body[1], body[2]),
            n if n > 3 => {
                let nc = u16::from_be_bytes([body[1], body[2]]) as usize;
                if nc == 0 {
                    return Err(Error::InvalidApdu("extended lc of zero".into()));
                }
                let rest = &body[3..];
                if rest.len() == nc {
                    // Case 3E
                    capdu.data = rest.to_vec();
                } else if rest.len() == nc + 2 {
                    // Case 4E
                    capdu.data = rest[..nc].to_vec();
                    capdu.ne = extended_ne(rest[nc], rest[nc + 1]);
                } else {
                    return Err(Error::InvalidApdu(format!(
                        "extended lc {} does not match body length {}",
                        nc,
                        rest.len()
                    )));
                }
            }
            n => {
                return Err(Error::InvalidApdu(format!(
                    "invalid body length {} for extended apdu",
                    n
                )));
            }
        }

        Ok(capdu)
    }
}

fn short_ne(le: u8) -> usize {
    if le == 0 { MAX_SHORT_NE } else { le as usize }
}

fn extended_ne(hi: u8, lo: u8) -> usize {
    match u16::from_be_bytes([hi, lo]) {
        0 => MAX_EXTENDED_NE,
        n => n as usize,
    }
}

/// Response APDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rapdu {
    /// Response data
    pub data: Vec<u8>,
    /// Status word, first byte
    pub sw1: u8,
    /// Status word, second byte
    pub sw2: u8,
}

impl Rapdu {
    /// Response from data and status word.
    pub fn new(data: impl Into<Vec<u8>>, sw1: u8, sw2: u8) -> Self {
        Self {
            data: data.into(),
            sw1,
            sw2,
        }
    }

    /// Both status bytes as one word.
    pub fn sw(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// `90 00`
    pub fn is_success(&self) -> bool {
        self.sw() == 0x9000
    }

    /// Data followed by SW1 SW2.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 2);
        out.extend_from_slice(&self.data);
        out.push(self.sw1);
        out.push(self.sw2);
        out
    }

    /// Split off the trailing status word.
    pub fn parse(b: &[u8]) -> Result<Self> {
        if b.len() < 2 {
            return Err(Error::InvalidApdu(format!(
                "response too short: {} bytes",
                b.len()
            )));
        }
        let split = b.len() - 2;
        Ok(Self::new(&b[..split], b[split], b[split + 1]))
    }
}
