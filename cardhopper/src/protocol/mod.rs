// cardhopper/src/protocol/mod.rs

//! Wire formats: relay packets, Proxmark3 commands and ISO14443-4 block
//! headers.

pub mod block;
pub mod channel;
pub mod command;
pub mod packet;

pub use block::{BlockHeader, BlockType, Rats};
pub use channel::PacketChannel;
pub use command::Command;
pub use packet::{
    MAGIC_CARD, MAGIC_END, MAGIC_ERR, MAGIC_READ, MAGIC_RESTART, Packet, encode,
};
