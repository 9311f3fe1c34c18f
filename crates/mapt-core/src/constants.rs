//! # Protocol Constants
//!
//! Fundamental constants for share accounting including:
//! - Token and feed decimal conventions
//! - Bootstrap exchange rates for empty ledgers
//! - Fee and reserve defaults
//! - Oracle staleness and lock defaults
//! - Well-known registry identifiers

// ============================================================================
// Decimal Conventions
// ============================================================================

/// Decimals of pool share tokens (APT) and the meta pool token (mAPT)
pub const SHARE_DECIMALS: u8 = 18;

/// Decimals of every feed answer (USD asset prices and TVL)
pub const FEED_DECIMALS: u8 = 8;

/// Largest decimals value whose power of ten fits in a u128
pub const MAX_TOKEN_DECIMALS: u8 = 38;

// ============================================================================
// Bootstrap Exchange Rates
// ============================================================================

/// Pool shares minted per normalized underlyer unit while share supply is zero
pub const DEFAULT_APT_TO_UNDERLYER_FACTOR: u128 = 1000;

/// mAPT minted per unit of transferred value while mAPT supply or TVL is zero
pub const DEFAULT_MAPT_TO_UNDERLYER_FACTOR: u128 = 1000;

// ============================================================================
// Fee and Reserve Constants
// ============================================================================

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Percentage denominator for the reserve target
pub const PERCENT_DENOMINATOR: u8 = 100;

/// Default share of pool value held back as idle reserve (percent)
pub const DEFAULT_RESERVE_PERCENTAGE: u8 = 5;

/// Default withdraw fee (0.1%)
pub const DEFAULT_WITHDRAW_FEE_BPS: u32 = 10;

/// Default arbitrage fee on early redemption (5%)
pub const DEFAULT_ARBITRAGE_FEE_BPS: u32 = 500;

/// Default window after a deposit during which redemption is "early" (1 day)
pub const DEFAULT_ARBITRAGE_FEE_PERIOD: i64 = 86_400;

// ============================================================================
// Oracle Constants
// ============================================================================

/// Default maximum age of a feed answer (1 day)
pub const DEFAULT_STALE_PERIOD: i64 = 86_400;

/// Default number of blocks the oracle stays locked after a rebalance
pub const DEFAULT_LOCK_PERIOD_BLOCKS: u64 = 135;

// ============================================================================
// Registry Identifiers
// ============================================================================

/// Meta pool token
pub const MAPT_ID: &str = "mApt";

/// Deployment account holding deployed capital
pub const LP_ACCOUNT_ID: &str = "lpAccount";

/// Oracle adapter
pub const ORACLE_ADAPTER_ID: &str = "oracleAdapter";

/// Asset allocation registry (TVL manager)
pub const TVL_MANAGER_ID: &str = "tvlManager";

/// Operator holding the LP role
pub const LP_SAFE_ID: &str = "lpSafe";

/// Operator holding the emergency role
pub const EMERGENCY_SAFE_ID: &str = "emergencySafe";

/// Operator holding the admin role
pub const ADMIN_SAFE_ID: &str = "adminSafe";
