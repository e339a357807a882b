//! Identifier for input elements.
//!
//! A plain `u64` keeps this crate free of any host document type; the engine
//! converts its element ids at the call boundary.

/// Opaque identifier for an input element within an [`InputValueStore`](crate::InputValueStore).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputId(u64);

impl InputId {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl From<u32> for InputId {
    #[inline]
    fn from(raw: u32) -> Self {
        Self::from_raw(raw as u64)
    }
}

impl From<u64> for InputId {
    #[inline]
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}
