//! Protocol deployment configuration.

use std::collections::BTreeSet;

use crate::constants::{
    ADMIN_SAFE_ID, DEFAULT_ARBITRAGE_FEE_BPS, DEFAULT_ARBITRAGE_FEE_PERIOD, DEFAULT_LOCK_PERIOD_BLOCKS,
    DEFAULT_RESERVE_PERCENTAGE, DEFAULT_STALE_PERIOD, DEFAULT_WITHDRAW_FEE_BPS, EMERGENCY_SAFE_ID, LP_ACCOUNT_ID,
    LP_SAFE_ID, MAPT_ID, MAX_TOKEN_DECIMALS, ORACLE_ADAPTER_ID, TVL_MANAGER_ID,
};
use crate::errors::{MaptError, MaptResult};
use crate::pool::PoolParams;

const RESERVED_IDS: [&str; 7] = [
    MAPT_ID,
    LP_ACCOUNT_ID,
    ORACLE_ADAPTER_ID,
    TVL_MANAGER_ID,
    ADMIN_SAFE_ID,
    EMERGENCY_SAFE_ID,
    LP_SAFE_ID,
];

/// Underlyer token and its initial feed answer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenConfig {
    pub symbol: String,
    pub decimals: u8,
    /// USD price with 8 decimals
    pub price: i64,
}

impl TokenConfig {
    pub fn new(symbol: impl Into<String>, decimals: u8, price: i64) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            price,
        }
    }

    /// Address of the token's price aggregator
    pub fn feed_source(&self) -> String {
        format!("{}-usd-agg", self.symbol.to_lowercase())
    }
}

/// Pool for one underlyer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Registry identifier, also used as the pool address
    pub id: String,
    /// Symbol of a configured token
    pub underlyer: String,
    #[cfg_attr(feature = "client", serde(default = "default_reserve_percentage"))]
    pub reserve_percentage: u8,
    #[cfg_attr(feature = "client", serde(default = "default_withdraw_fee_bps"))]
    pub withdraw_fee_bps: u32,
    #[cfg_attr(feature = "client", serde(default = "default_arbitrage_fee_bps"))]
    pub arbitrage_fee_bps: u32,
    #[cfg_attr(feature = "client", serde(default = "default_arbitrage_fee_period"))]
    pub arbitrage_fee_period: i64,
}

impl PoolConfig {
    pub fn new(id: impl Into<String>, underlyer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            underlyer: underlyer.into(),
            reserve_percentage: DEFAULT_RESERVE_PERCENTAGE,
            withdraw_fee_bps: DEFAULT_WITHDRAW_FEE_BPS,
            arbitrage_fee_bps: DEFAULT_ARBITRAGE_FEE_BPS,
            arbitrage_fee_period: DEFAULT_ARBITRAGE_FEE_PERIOD,
        }
    }

    pub fn params(&self) -> PoolParams {
        PoolParams {
            reserve_percentage: self.reserve_percentage,
            withdraw_fee_bps: self.withdraw_fee_bps,
            arbitrage_fee_bps: self.arbitrage_fee_bps,
            arbitrage_fee_period: self.arbitrage_fee_period,
        }
    }
}

#[cfg(feature = "client")]
fn default_reserve_percentage() -> u8 {
    DEFAULT_RESERVE_PERCENTAGE
}

#[cfg(feature = "client")]
fn default_withdraw_fee_bps() -> u32 {
    DEFAULT_WITHDRAW_FEE_BPS
}

#[cfg(feature = "client")]
fn default_arbitrage_fee_bps() -> u32 {
    DEFAULT_ARBITRAGE_FEE_BPS
}

#[cfg(feature = "client")]
fn default_arbitrage_fee_period() -> i64 {
    DEFAULT_ARBITRAGE_FEE_PERIOD
}

/// Everything needed to stand up a protocol instance
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolConfig {
    /// Maximum feed age in seconds
    pub stale_period: i64,
    /// Blocks the oracle stays locked after a rebalance
    pub default_lock_period: u64,
    pub admin_safe: String,
    pub emergency_safe: String,
    pub lp_safe: String,
    pub tokens: Vec<TokenConfig>,
    pub pools: Vec<PoolConfig>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            stale_period: DEFAULT_STALE_PERIOD,
            default_lock_period: DEFAULT_LOCK_PERIOD_BLOCKS,
            admin_safe: "adminSafe".to_string(),
            emergency_safe: "emergencySafe".to_string(),
            lp_safe: "lpSafe".to_string(),
            tokens: vec![
                TokenConfig::new("DAI", 18, 100_000_000),
                TokenConfig::new("USDC", 6, 100_000_000),
                TokenConfig::new("USDT", 6, 100_000_000),
            ],
            pools: vec![
                PoolConfig::new("daiPool", "DAI"),
                PoolConfig::new("usdcPool", "USDC"),
                PoolConfig::new("usdtPool", "USDT"),
            ],
        }
    }
}

impl ProtocolConfig {
    pub fn token(&self, symbol: &str) -> Option<&TokenConfig> {
        self.tokens.iter().find(|token| token.symbol == symbol)
    }

    pub fn validate(&self) -> MaptResult<()> {
        if self.stale_period <= 0 {
            return Err(MaptError::InvalidStalePeriod);
        }
        for safe in [&self.admin_safe, &self.emergency_safe, &self.lp_safe] {
            if safe.is_empty() {
                return Err(MaptError::InvalidAddress);
            }
        }

        let mut symbols = BTreeSet::new();
        for token in &self.tokens {
            if token.symbol.is_empty() {
                return Err(MaptError::InvalidParameter("empty token symbol".to_string()));
            }
            if !symbols.insert(token.symbol.as_str()) {
                return Err(MaptError::InvalidParameter(format!("duplicate token {}", token.symbol)));
            }
            if token.decimals > MAX_TOKEN_DECIMALS {
                return Err(MaptError::InvalidParameter(format!(
                    "{} decimals {} exceed {}",
                    token.symbol, token.decimals, MAX_TOKEN_DECIMALS
                )));
            }
            if token.price <= 0 {
                return Err(MaptError::InvalidParameter(format!("{} price must be positive", token.symbol)));
            }
        }

        let mut ids = BTreeSet::new();
        for pool in &self.pools {
            if pool.id.is_empty() {
                return Err(MaptError::InvalidParameter("empty pool id".to_string()));
            }
            if RESERVED_IDS.contains(&pool.id.as_str()) {
                return Err(MaptError::InvalidParameter(format!("pool id {} is reserved", pool.id)));
            }
            if !ids.insert(pool.id.as_str()) {
                return Err(MaptError::InvalidParameter(format!("duplicate pool {}", pool.id)));
            }
            if self.token(&pool.underlyer).is_none() {
                return Err(MaptError::InvalidParameter(format!(
                    "pool {} uses unknown token {}",
                    pool.id, pool.underlyer
                )));
            }
            pool.params().validate()?;
        }
        Ok(())
    }
}
