// cardhopper/src/cardhopper/config.rs

//! CardHopper relay configuration

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tag type announced to the relay: ISO14443-4 Type 4A
pub const TAG_TYPE: u8 = 0x0B;

/// Frame waiting time integer sent in the timing block
pub const FWI: u8 = 0x0E;

/// Start-up frame guard time integer sent in the timing block
pub const SFGI: u8 = 0x0B;

/// Wait after entering standalone mode (ms)
pub const STANDALONE_SETTLE_MS: u64 = 1000;

/// Wait between configuration blocks (ms)
pub const BLOCK_SETTLE_MS: u64 = 100;

/// Wait after each restart signal during teardown (ms)
pub const TEARDOWN_DELAY_MS: u64 = 100;

/// Timing knobs of a CardHopper session. `Default` gives the values the
/// firmware needs; tests use [`SessionConfig::immediate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Wait after entering standalone mode
    pub standalone_settle: Duration,
    /// Wait between setup blocks
    pub block_settle: Duration,
    /// Wait between the packets sent by `close`
    pub teardown_delay: Duration,
    /// Flush transport input before setup
    pub reset_input: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            standalone_settle: Duration::from_millis(STANDALONE_SETTLE_MS),
            block_settle: Duration::from_millis(BLOCK_SETTLE_MS),
            teardown_delay: Duration::from_millis(TEARDOWN_DELAY_MS),
            reset_input: true,
        }
    }
}

impl SessionConfig {
    /// No delays at all.
    pub fn immediate() -> Self {
        Self {
            standalone_settle: Duration::ZERO,
            block_settle: Duration::ZERO,
            teardown_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Total time setup spends waiting.
    pub fn setup_delay(&self) -> Duration {
        self.standalone_settle + self.block_settle * 4
    }
}
