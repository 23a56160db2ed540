// cardhopper/src/type4/emulator.rs

//! Card-side ISO14443-4 block protocol.
//!
//! [`Type4Emulator::process`] turns one block received from the reader into
//! the block to send back; [`Type4Emulator::run`] drives that against a
//! [`PacketChannel`] until cancelled. Replies to I-blocks carry the
//! PCB/CID/NAD header of the block they answer.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::Result;
use crate::cancel::CancelContext;
use crate::constants::*;
use crate::protocol::{BlockHeader, BlockType, Packet, PacketChannel, Rats};
use crate::transport::Transport;
use crate::type4::Handler;
use crate::utils::LogHex;

/// Protocol state owned by the emulation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    cid: Option<u8>,
    last_sent: Packet,
    chaining: Vec<u8>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            cid: None,
            last_sent: Packet::from_byte(PCB_TYPE_I),
            chaining: Vec::new(),
        }
    }
}

impl SessionState {
    /// CID negotiated by the last RATS, `None` before RATS or after DESELECT.
    pub fn cid(&self) -> Option<u8> {
        self.cid
    }

    /// Current block number of the card.
    pub fn block_number(&self) -> u8 {
        self.last_sent.first().map_or(0, |pcb| pcb & PCB_BLOCK_NUMBER)
    }

    /// Block retransmitted when the reader asks for the current block again.
    pub fn last_sent(&self) -> &Packet {
        &self.last_sent
    }

    /// Bytes accumulated from chained I-blocks so far.
    pub fn chained(&self) -> &[u8] {
        &self.chaining
    }
}

/// Outcome of processing one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send this block to the reader.
    Reply(Packet),
    /// Send nothing.
    Silent,
    /// The handler was cancelled; leave the loop without replying.
    Stop,
}

impl Step {
    fn empty() -> Self {
        Step::Reply(Packet::new())
    }
}

/// Card side of the ISO14443-4 block protocol, answering through a
/// [`Handler`].
pub struct Type4Emulator {
    handler: Arc<dyn Handler>,
    state: SessionState,
}

impl Type4Emulator {
    /// Emulator in its initial state.
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            state: SessionState::default(),
        }
    }

    /// Current protocol state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Forget the negotiated CID, chaining buffer and last sent block.
    pub fn reset_state(&mut self) {
        self.state = SessionState::default();
    }

    /// Process one block from the reader.
    ///
    /// Malformed and unsupported blocks are answered with an empty block and
    /// logged; handler failures, tracer integrity errors included, become a
    /// `6F 00` response. The only error is a reply too big for one packet.
    pub async fn process(&mut self, ctx: &CancelContext, block: &Packet) -> Result<Step> {
        if block.is_empty() {
            warn!("got empty packet from cardhopper standalone");
            return Ok(Step::empty());
        }

        debug!("got cardhopper packet={}", LogHex(block.as_bytes()));

        if let Some(rats) = Rats::parse(block) {
            debug!("got RATS cid={} fsdi={}", rats.cid, rats.fsdi);
            self.state.cid = Some(rats.cid);
            // First block after activation carries block number 1.
            self.state.last_sent.as_mut_slice()[0] |= PCB_BLOCK_NUMBER;
            return Ok(Step::Silent);
        }

        let pcb = block[0];
        if pcb & PCB_CID != 0 && block.len() >= 2 {
            let cid = block[1] & 0x0F;
            if self.state.cid != Some(cid) {
                warn!("ignoring packet for other cid={} packet={}", cid, LogHex(block.as_bytes()));
                return Ok(Step::empty());
            }
        }

        let header = match BlockHeader::parse(block) {
            Ok(h) => h,
            Err(e) => {
                warn!("{} packet={}", e, LogHex(block.as_bytes()));
                return Ok(Step::empty());
            }
        };

        if !header.has_expected_bits() {
            warn!(
                "{:?}-block with unexpected bits set packet={}",
                header.block_type,
                LogHex(block.as_bytes())
            );
        }

        match header.block_type {
            BlockType::R => Ok(self.r_block(&header, block)),
            BlockType::S => Ok(self.s_block(ctx, &header, block).await),
            BlockType::I => self.i_block(ctx, &header, block).await,
        }
    }

    fn r_block(&mut self, header: &BlockHeader, block: &Packet) -> Step {
        if header.block_number == self.state.block_number() {
            warn!("R-block triggering retransmit of last block packet={}", LogHex(block.as_bytes()));
            return Step::Reply(self.state.last_sent.clone());
        }

        if header.is_nak() {
            let mut ack = block.clone();
            ack.as_mut_slice()[0] ^= PCB_BLOCK_NUMBER;
            self.state.last_sent = ack.clone();
            return Step::Reply(ack);
        }

        warn!("unexpected R-block chaining ack packet={}", LogHex(block.as_bytes()));
        Step::empty()
    }

    async fn s_block(&mut self, ctx: &CancelContext, header: &BlockHeader, block: &Packet) -> Step {
        if !header.is_deselect() {
            warn!("ignoring unexpected S-block packet={}", LogHex(block.as_bytes()));
            return Step::empty();
        }

        debug!("DESELECT");
        self.state.cid = None;
        self.state.chaining.clear();
        self.handler.reset(ctx).await;
        Step::Reply(block.clone())
    }

    async fn i_block(
        &mut self,
        ctx: &CancelContext,
        header: &BlockHeader,
        block: &[u8],
    ) -> Result<Step> {
        let header_len = header.len();
        if block.len() < header_len + 1 {
            warn!("truncated packet={}", LogHex(block));
            return Ok(Step::empty());
        }
        let inf = &block[header_len..];

        if header.chaining {
            if header.has_nad {
                warn!("NAD not supported with chaining packet={}", LogHex(block));
            }
            self.state.chaining.extend_from_slice(inf);

            let mut ack = Packet::new();
            ack.write(&[PCB_R_ACK | (header.pcb & (PCB_CID | PCB_BLOCK_NUMBER))])?;
            if header.has_cid {
                ack.write(&block[1..2])?;
            }
            return Ok(Step::Reply(ack));
        }

        let capdu = if self.state.chaining.is_empty() {
            inf.to_vec()
        } else {
            let mut capdu = std::mem::take(&mut self.state.chaining);
            capdu.extend_from_slice(inf);
            capdu
        };

        let rapdu = match self.handler.exchange(ctx, &capdu).await {
            Ok(rapdu) => rapdu,
            Err(e) if e.is_cancelled() || ctx.is_cancelled() => return Ok(Step::Stop),
            Err(e) => {
                warn!("failed to process apdu={}: {}", LogHex(&capdu), e);
                SW_INTERNAL_EXCEPTION.to_vec()
            }
        };

        debug!("sending rapdu={}", LogHex(&rapdu));
        let mut reply = Packet::from_slice(&block[..header_len])?;
        reply.write(&rapdu)?;
        self.state.last_sent = reply.clone();
        Ok(Step::Reply(reply))
    }

    /// Answer blocks from `channel` until `ctx` is cancelled or the channel
    /// fails. Cancellation ends the loop with `Ok(())`, also while a read or
    /// a reply write is pending. While nothing arrives the relay is polled
    /// every millisecond.
    pub async fn run<T: Transport>(
        &mut self,
        ctx: &CancelContext,
        channel: &mut PacketChannel<T>,
    ) -> Result<()> {
        self.reset_state();
        let mut block = Packet::new();

        while !ctx.is_cancelled() {
            let read = tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                res = channel.read_packet(&mut block) => res?,
            };
            if read == 0 {
                tokio::time::sleep(Duration::from_millis(READ_RETRY_MS)).await;
                continue;
            }

            match self.process(ctx, &block).await? {
                Step::Reply(reply) => {
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => break,
                        res = channel.write_with_ack(&reply) => res?,
                    };
                }
                Step::Silent => {}
                Step::Stop => break,
            }
        }

        debug!("emulation loop stopped");
        Ok(())
    }
}
