//! # mAPT Core - Share Accounting Engine
//!
//! This crate contains the share accounting and rebalancing logic behind the
//! meta pool token (mAPT) and the per-stablecoin liquidity pools it funds.
//! It provides:
//!
//! - Pure math for pool share issuance, redemption fees and reserve top-ups
//! - Pure math for mAPT mint/burn deltas against a TVL oracle
//! - An oracle adapter with staleness checks, manual overrides and block locks
//! - A transactional, single-threaded ledger simulator (`Protocol`) wiring the
//!   components together with all-or-nothing operation semantics
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde serialization for off-chain use

pub mod access;
pub mod allocation;
pub mod constants;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod lp_account;
pub mod mapt;
pub mod math;
pub mod oracle;
pub mod pool;
pub mod protocol;
pub mod registry;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use errors::{MaptError, MaptResult};
pub use protocol::{PoolConfig, Protocol, ProtocolConfig, TokenConfig};
pub use types::*;
