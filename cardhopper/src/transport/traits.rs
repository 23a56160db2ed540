// cardhopper/src/transport/traits.rs

//! The [`Transport`] trait.

use async_trait::async_trait;

use crate::Result;

/// Transport trait abstracts the byte stream to the relay device away from
/// the framing and block protocol logic.
#[async_trait]
pub trait Transport: Send {
    /// Write all of `data` to the device
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes. `Ok(0)` means nothing was available
    /// yet, e.g. a read timeout on the underlying port. A closed stream is
    /// reported as an [`UnexpectedEof`](std::io::ErrorKind::UnexpectedEof)
    /// I/O error.
    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Discard any input the transport has buffered but not yet delivered.
    /// Transports without an input buffer keep the default no-op.
    async fn reset_input_buffer(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        (**self).send(data).await
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).receive(buf).await
    }

    async fn reset_input_buffer(&mut self) -> Result<()> {
        (**self).reset_input_buffer().await
    }
}
