// cardhopper/src/transport/acker.rs

//! Local acknowledgement of relay writes.

use async_trait::async_trait;

use crate::Result;
use crate::constants::ACK_BYTE;
use crate::protocol::command::Command;
use crate::transport::traits::Transport;

/// Local acknowledgement for the CardHopper firmware.
///
/// In standalone mode the relay acknowledges packets itself, so after every
/// successful write the next read is answered with a synthetic `0xFE`
/// instead of consuming a byte from the device. The enter-standalone command
/// is the exception: it goes to the Proxmark firmware, which does not ack, so
/// the following read must reach the real stream.
#[derive(Debug)]
pub struct Acker<T> {
    inner: T,
    exempt: Vec<u8>,
    pending_ack: bool,
}

impl<T: Transport> Acker<T> {
    /// Wrap `inner`.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            exempt: Command::ENTER_STANDALONE.to_bytes(),
            pending_ack: false,
        }
    }

    /// True when the next read will be answered locally.
    pub fn pending_ack(&self) -> bool {
        self.pending_ack
    }

    /// Wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Give back the wrapped transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for Acker<T> {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let res = self.inner.send(data).await;
        self.pending_ack = res.is_ok() && data != self.exempt.as_slice();
        res
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pending_ack && !buf.is_empty() {
            self.pending_ack = false;
            buf[0] = ACK_BYTE;
            return Ok(1);
        }
        self.inner.receive(buf).await
    }

    async fn reset_input_buffer(&mut self) -> Result<()> {
        self.inner.reset_input_buffer().await
    }
}
