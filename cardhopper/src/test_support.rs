//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize the recording handler/tracer doubles and the
//! in-memory relay link so tests across the crate and tests/ directory can
//! reuse the same logic.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::DuplexStream;

use crate::cancel::CancelContext;
use crate::error::TraceDirection;
use crate::exchange::Exchanger;
use crate::transport::StreamTransport;
use crate::type4::{Handler, Tracer};
use crate::{Error, Result};

/// Handler that records every command APDU and reset, answering from a
/// queue of canned results (`90 00` once the queue is empty).
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct RecordingHandler {
    capdus: Mutex<Vec<Vec<u8>>>,
    results: Mutex<VecDeque<Result<Vec<u8>>>>,
    resets: AtomicUsize,
    cancel_after: Mutex<Option<usize>>,
}

impl RecordingHandler {
    /// Handler with an empty response queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next exchange.
    pub fn push_response(&self, rapdu: Vec<u8>) {
        self.results.lock().unwrap().push_back(Ok(rapdu));
    }

    /// Queue a failure for the next exchange.
    pub fn push_error(&self, err: Error) {
        self.results.lock().unwrap().push_back(Err(err));
    }

    /// Cancel the context passed to the `n`th exchange (after answering it).
    pub fn cancel_after(&self, n: usize) {
        *self.cancel_after.lock().unwrap() = Some(n);
    }

    /// Command APDUs received so far.
    pub fn capdus(&self) -> Vec<Vec<u8>> {
        self.capdus.lock().unwrap().clone()
    }

    /// Number of reset calls.
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Exchanger for RecordingHandler {
    async fn exchange(&self, ctx: &CancelContext, capdu: &[u8]) -> Result<Vec<u8>> {
        let calls = {
            let mut capdus = self.capdus.lock().unwrap();
            capdus.push(capdu.to_vec());
            capdus.len()
        };
        if *self.cancel_after.lock().unwrap() == Some(calls) {
            ctx.cancel();
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![0x90, 0x00]))
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    async fn reset(&self, _ctx: &CancelContext) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tracer that keeps a copy of everything it observes.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Mutex<Vec<(TraceDirection, Vec<u8>)>>,
}

impl RecordingTracer {
    /// Observations in call order.
    pub fn events(&self) -> Vec<(TraceDirection, Vec<u8>)> {
        self.events.lock().unwrap().clone()
    }
}

impl Tracer for RecordingTracer {
    fn reader(&self, _ctx: &CancelContext, capdu: &mut [u8]) {
        self.events
            .lock()
            .unwrap()
            .push((TraceDirection::Reader, capdu.to_vec()));
    }

    fn tag(&self, _ctx: &CancelContext, rapdu: &mut [u8]) {
        self.events
            .lock()
            .unwrap()
            .push((TraceDirection::Tag, rapdu.to_vec()));
    }
}

/// Misbehaving tracer that flips the first byte of one direction.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub struct MutatingTracer {
    direction: TraceDirection,
}

impl MutatingTracer {
    /// Tracer that munges command APDUs.
    pub fn reader() -> Self {
        Self {
            direction: TraceDirection::Reader,
        }
    }

    /// Tracer that munges response APDUs.
    pub fn tag() -> Self {
        Self {
            direction: TraceDirection::Tag,
        }
    }

    fn munge(&self, direction: TraceDirection, buf: &mut [u8]) {
        if direction == self.direction {
            if let Some(b) = buf.first_mut() {
                *b ^= 0xFF;
            }
        }
    }
}

impl Tracer for MutatingTracer {
    fn reader(&self, _ctx: &CancelContext, capdu: &mut [u8]) {
        self.munge(TraceDirection::Reader, capdu)
    }

    fn tag(&self, _ctx: &CancelContext, rapdu: &mut [u8]) {
        self.munge(TraceDirection::Tag, rapdu)
    }
}

/// In-memory link to a simulated relay: the transport for the session and
/// the far end of the pipe, where tests play the device.
#[doc(hidden)]
pub fn relay_link() -> (StreamTransport<DuplexStream>, DuplexStream) {
    let (near, far) = tokio::io::duplex(4096);
    (StreamTransport::new(near), far)
}
