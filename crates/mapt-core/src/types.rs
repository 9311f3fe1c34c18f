//! # Core Type Definitions
//!
//! Identity and execution-environment types shared by every component.

use std::fmt;

/// Opaque account identity (externally owned account or component)
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(transparent))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(String);

impl Address {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Address {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Block height
pub type BlockNumber = u64;

/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Execution environment visible to every operation
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEnv {
    /// Current block height
    pub block_number: BlockNumber,
    /// Timestamp of the current block
    pub timestamp: Timestamp,
}

impl BlockEnv {
    pub fn new(block_number: BlockNumber, timestamp: Timestamp) -> Self {
        Self {
            block_number,
            timestamp,
        }
    }

    /// Advance height without moving the clock
    pub fn advance_blocks(&mut self, blocks: u64) {
        self.block_number = self.block_number.saturating_add(blocks);
    }

    /// Advance the clock without producing blocks
    pub fn advance_time(&mut self, seconds: i64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }

    /// Produce `blocks` blocks spaced `seconds_per_block` apart
    pub fn mine(&mut self, blocks: u64, seconds_per_block: i64) {
        self.advance_blocks(blocks);
        let elapsed = (blocks as i64).saturating_mul(seconds_per_block);
        self.advance_time(elapsed);
    }
}

impl Default for BlockEnv {
    fn default() -> Self {
        Self::new(1, 1_600_000_000)
    }
}
