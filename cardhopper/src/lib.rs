// cardhopper/src/lib.rs

//! cardhopper
//!
//! ISO14443-4 (Type 4) card emulation through a Proxmark3 running the
//! CardHopper standalone relay.
#![warn(missing_docs)]

pub mod apdu;
pub mod bridge;
pub mod cancel;
pub mod cardhopper;
pub mod constants;
pub mod error;
pub mod exchange;
pub mod prelude;
pub mod protocol;
pub mod test_support;
pub mod transport;
pub mod type4;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the card identity are available for consumers and for convenient
// `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
