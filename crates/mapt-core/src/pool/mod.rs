//! Per-underlyer liquidity pools.

pub mod math;
pub mod token;

pub use math::{bootstrap_mint_amount, quote_redeem, PoolSnapshot, RedeemQuote};
pub use token::{PoolLocks, PoolParams, PoolToken};
