// cardhopper/src/error.rs

//! Crate error type.

use thiserror::Error;

use crate::cancel::Cause;

/// Which side of an exchange a tracer was observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDirection {
    /// Command APDU coming from the reader
    Reader,
    /// Response APDU produced by the emulated tag
    Tag,
}

impl std::fmt::Display for TraceDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceDirection::Reader => f.write_str("reader"),
            TraceDirection::Tag => f.write_str("tag"),
        }
    }
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// Payload does not fit one relay packet
    #[error("packet too big: {len} bytes exceeds limit of {max}")]
    PacketTooBig {
        /// Offending payload length
        len: usize,
        /// Largest allowed payload
        max: usize,
    },

    /// The relay acknowledged with something other than `0xFE`
    #[error("bad ack: {0:#04x}")]
    BadAck(u8),

    /// No acknowledgement arrived
    #[error("bad ack: stream closed before acknowledgement")]
    MissingAck,

    /// The stream closed in the middle of a packet
    #[error("truncated read: expected {expected} bytes, got {actual}")]
    TruncatedRead {
        /// Payload length announced by the length byte
        expected: usize,
        /// Payload bytes read before the stream closed
        actual: usize,
    },

    /// ISO14443-4 block that cannot be decoded
    #[error("malformed block: {0}")]
    MalformedBlock(String),

    /// A tracer changed the APDU it was given
    #[error("{0} tracer munged data")]
    TracerMutated(TraceDirection),

    /// Transport failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation's context was cancelled
    #[error("operation cancelled: {0}")]
    Cancelled(Cause),

    /// Failure reported by an APDU handler
    #[error("handler error: {0}")]
    Handler(String),

    /// APDU that cannot be encoded or parsed
    #[error("invalid apdu: {0}")]
    InvalidApdu(String),

    /// A blocking call panicked or was aborted
    #[error("blocking task failed: {0}")]
    TaskFailed(String),

    /// Builder was missing a required part
    #[error("missing component: {0}")]
    MissingComponent(&'static str),
}

impl Error {
    /// True when the error is the expected shutdown path rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    /// True when the transport reported that the stream was closed.
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
