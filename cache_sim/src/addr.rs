use std::fmt;

use serde::{Deserialize, Serialize};

/// raw byte address read from a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Addr(u32);

impl Addr {
    pub fn new(v: u32) -> Self {
        Self(v)
    }
    pub fn inner(self) -> u32 {
        self.0
    }
    /// drops the block-offset bits.
    ///
    /// `offset_bits` is `floor(log2(line_size))`, so a line size that is not
    /// a power of two discards fewer bits than the line spans.
    pub fn block(self, offset_bits: u32) -> BlockId {
        BlockId(self.0.checked_shr(offset_bits).unwrap_or(0))
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Address with the block offset removed; the unit of caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(u32);

impl BlockId {
    pub fn new(v: u32) -> Self {
        Self(v)
    }
    pub fn into_inner(self) -> u32 {
        self.0
    }
    /// the all-ones pattern once used to mark empty lines.
    pub fn is_all_ones(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}
