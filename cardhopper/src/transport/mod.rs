// cardhopper/src/transport/mod.rs

//! Byte transports to the relay device.

pub mod acker;
pub mod mock;
pub mod stream;
pub mod traits;

pub use acker::Acker;
pub use mock::MockTransport;
pub use stream::StreamTransport;
pub use traits::Transport;
