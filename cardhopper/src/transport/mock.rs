// cardhopper/src/transport/mock.rs

//! In-memory transport for tests.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::transport::traits::Transport;
use crate::{Error, Result};

/// Mock transport for unit tests. It records sent payloads and serves queued
/// input bytes. An empty input queue reads as "nothing available" (`Ok(0)`),
/// or as end of stream once [`close`](MockTransport::close) was called.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Payload of every successful send call
    pub sent: Vec<Vec<u8>>,
    /// Bytes served to receive calls
    pub input: VecDeque<u8>,
    /// Testing hook: cap on bytes returned per receive call, to exercise
    /// partial reads
    pub max_chunk: Option<usize>,
    /// Testing hook: number of subsequent send calls that should fail
    pub send_failures: usize,
    /// Number of receive calls that reached the mock
    pub receive_calls: usize,
    /// Number of reset_input_buffer calls
    pub input_resets: usize,
    /// Report end of stream once the input queue drains
    pub closed: bool,
}

impl MockTransport {
    /// Mock with no input and no failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw input bytes.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Queue a length-prefixed packet as the relay device would send it.
    pub fn push_packet(&mut self, payload: &[u8]) {
        self.input.push_back(payload.len() as u8);
        self.push_input(payload);
    }

    /// Set how many subsequent send calls should fail (for tests).
    pub fn set_send_failures(&mut self, n: usize) {
        self.send_failures = n;
    }

    /// Simulate the peer closing the stream after the queued input.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Everything sent so far, concatenated.
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.sent.concat()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.send_failures > 0 {
            self.send_failures -= 1;
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock send failure",
            )));
        }
        self.sent.push(data.to_vec());
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.receive_calls += 1;
        if self.closed && self.input.is_empty() && !buf.is_empty() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "mock stream closed",
            )));
        }
        let limit = self.max_chunk.unwrap_or(usize::MAX).min(buf.len());
        let mut n = 0;
        while n < limit {
            match self.input.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    async fn reset_input_buffer(&mut self) -> Result<()> {
        // Mirrors a serial port flush: queued input is dropped.
        self.input_resets += 1;
        self.input.clear();
        Ok(())
    }
}
