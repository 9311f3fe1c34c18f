//! Protocol event log.
//!
//! Events are part of transactional state: a reverted operation leaves
//! none behind.

use crate::types::{Address, BlockNumber, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolEvent {
    // Pool
    DepositedApt {
        pool: Address,
        sender: Address,
        token: Address,
        token_amount: u128,
        apt_minted: u128,
        total_value: u128,
    },
    RedeemedApt {
        pool: Address,
        sender: Address,
        token: Address,
        redeemed_token_amount: u128,
        apt_redeemed: u128,
        total_value: u128,
    },
    PoolPaused {
        pool: Address,
        paused: bool,
    },
    AddLiquidityLocked {
        pool: Address,
        locked: bool,
    },
    RedeemLocked {
        pool: Address,
        locked: bool,
    },
    ReservePercentageChanged {
        pool: Address,
        reserve_percentage: u8,
    },
    WithdrawFeeChanged {
        pool: Address,
        withdraw_fee_bps: u32,
    },
    ArbitrageFeeChanged {
        pool: Address,
        arbitrage_fee_bps: u32,
        arbitrage_fee_period: i64,
    },

    // Meta pool token
    MaptMinted {
        pool: Address,
        amount: u128,
    },
    MaptBurned {
        pool: Address,
        amount: u128,
    },
    FundedLpAccount {
        pool: Address,
        token: Address,
        amount: u128,
    },
    WithdrawnFromLpAccount {
        pool: Address,
        token: Address,
        amount: u128,
    },
    Erc20Registered {
        token: Address,
        symbol: String,
        decimals: u8,
    },

    // Oracle
    OracleLocked {
        lock_end: BlockNumber,
    },
    OracleUnlocked,
    TvlOverrideSet {
        value: i128,
        expiry_block: BlockNumber,
    },
    TvlOverrideUnset,
    AssetOverrideSet {
        asset: Address,
        value: i128,
        expiry_block: BlockNumber,
    },
    AssetOverrideUnset {
        asset: Address,
    },
    TvlSourceChanged {
        source: Address,
    },
    AssetSourceChanged {
        asset: Address,
        source: Address,
    },
    StalePeriodChanged {
        stale_period: i64,
    },
    DefaultLockPeriodChanged {
        blocks: u64,
    },
}

/// Event stamped with the block it was emitted in
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct EventRecord {
    pub block_number: BlockNumber,
    pub timestamp: Timestamp,
    pub event: ProtocolEvent,
}
