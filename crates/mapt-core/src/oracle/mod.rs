//! Oracle adapter and the external feed network it reads from.

pub mod adapter;
pub mod feed;

pub use adapter::{ManualValue, OracleAdapter};
pub use feed::{AggregatorFeed, FeedNetwork};
