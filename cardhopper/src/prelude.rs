// cardhopper/src/prelude.rs

//! Commonly used types, for glob import.

pub use crate::apdu::{Capdu, Rapdu};
pub use crate::bridge::run_cancellable;
pub use crate::cancel::{CancelContext, Cause};
pub use crate::cardhopper::{CardHopper, CardHopperBuilder, SessionConfig};
pub use crate::exchange::{ApduExchanger, Apduer, ApduerFn, Exchanger, ExchangerFn};
pub use crate::protocol::{Packet, PacketChannel};
pub use crate::transport::{StreamTransport, Transport};
pub use crate::type4::{EmulatedCard, Handler, Tracer, TracingExchanger, Type4Emulator};
pub use crate::{CardIdentity, Error, Result, TraceDirection};

// Re-export small utilities for convenience
pub use crate::utils::LogHex;
