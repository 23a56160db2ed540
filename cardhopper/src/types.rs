// cardhopper/src/types.rs

//! Identity of the emulated card.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Static parameters of the emulated card, fixed for a session.
///
/// Only the UID and ATS are sent to the relay during setup; SAK, ATQA and
/// ATR are kept so handlers and tracers can report the full identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CardIdentity {
    /// Anticollision UID (4, 7 or 10 bytes)
    pub uid: Vec<u8>,
    /// Select acknowledge
    pub sak: u8,
    /// Answer to request, type A
    pub atqa: Vec<u8>,
    /// Answer to reset as reported by PC/SC
    pub atr: Vec<u8>,
    /// Answer to select, starting with its TL byte
    pub ats: Vec<u8>,
}

impl CardIdentity {
    /// Identity with only the UID and ATS set.
    pub fn new(uid: impl Into<Vec<u8>>, ats: impl Into<Vec<u8>>) -> Self {
        Self {
            uid: uid.into(),
            ats: ats.into(),
            ..Default::default()
        }
    }

    /// Set the SAK.
    pub fn with_sak(mut self, sak: u8) -> Self {
        self.sak = sak;
        self
    }

    /// Set the ATQA.
    pub fn with_atqa(mut self, atqa: impl Into<Vec<u8>>) -> Self {
        self.atqa = atqa.into();
        self
    }

    /// Set the ATR.
    pub fn with_atr(mut self, atr: impl Into<Vec<u8>>) -> Self {
        self.atr = atr.into();
        self
    }
}
