//! External price-feed network.
//!
//! Each aggregator publishes a signed answer with 8 decimals and the
//! timestamp of its last update. Aggregators are addressed like contracts
//! so the adapter can be re-pointed at a different source.

use std::collections::BTreeMap;

use crate::errors::{MaptError, MaptResult};
use crate::types::{Address, Timestamp};

/// Latest round of an aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregatorFeed {
    pub answer: i128,
    pub updated_at: Timestamp,
}

impl AggregatorFeed {
    pub fn new(answer: i128, updated_at: Timestamp) -> Self {
        Self { answer, updated_at }
    }

    /// Seconds since the last update, never negative
    pub fn age(&self, now: Timestamp) -> i64 {
        now.saturating_sub(self.updated_at).max(0)
    }
}

/// All aggregators known to the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedNetwork {
    feeds: BTreeMap<Address, AggregatorFeed>,
}

impl FeedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy an aggregator with an initial answer
    pub fn deploy(&mut self, source: Address, answer: i128, updated_at: Timestamp) -> MaptResult<()> {
        if source.is_empty() {
            return Err(MaptError::InvalidSource);
        }
        if self.feeds.contains_key(&source) {
            return Err(MaptError::AlreadyRegistered(source));
        }
        self.feeds.insert(source, AggregatorFeed::new(answer, updated_at));
        Ok(())
    }

    /// Publish a new round
    pub fn submit(&mut self, source: &Address, answer: i128, updated_at: Timestamp) -> MaptResult<()> {
        let feed = self.feeds.get_mut(source).ok_or(MaptError::InvalidSource)?;
        *feed = AggregatorFeed::new(answer, updated_at);
        Ok(())
    }

    pub fn contains(&self, source: &Address) -> bool {
        self.feeds.contains_key(source)
    }

    pub fn latest(&self, source: &Address) -> MaptResult<AggregatorFeed> {
        self.feeds.get(source).copied().ok_or(MaptError::InvalidSource)
    }
}
