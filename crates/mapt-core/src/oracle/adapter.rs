//! # Oracle Adapter
//!
//! Single source of TVL and asset prices for pools and the meta pool token.
//!
//! Read order for every value:
//! 1. Locked (`block < lock_end`) → `Locked`
//! 2. Active manual override → override value
//! 3. Feed answer: negative → `NegativeValue`, older than the stale period →
//!    `StaleData`, then zero handling
//!
//! The lock is cooperative: components that need a stable snapshot across
//! several reads extend it, and nothing can shorten it except an emergency
//! unlock.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::access::{AccessControl, Operation};
use crate::constants::{DEFAULT_LOCK_PERIOD_BLOCKS, DEFAULT_STALE_PERIOD};
use crate::errors::{MaptError, MaptResult};
use crate::oracle::feed::FeedNetwork;
use crate::types::{Address, BlockEnv, BlockNumber};

/// Emergency value that shadows a feed for a number of blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct ManualValue {
    pub value: i128,
    pub set_block: BlockNumber,
    pub duration_blocks: u64,
}

impl ManualValue {
    pub fn expiry_block(&self) -> BlockNumber {
        self.set_block.saturating_add(self.duration_blocks)
    }

    pub fn is_active(&self, block: BlockNumber) -> bool {
        block < self.expiry_block()
    }
}

/// Oracle adapter state
#[derive(Debug, Clone)]
pub struct OracleAdapter {
    access: AccessControl,
    tvl_source: Address,
    asset_sources: BTreeMap<Address, Address>,
    stale_period: i64,
    default_lock_period: u64,
    lock_end: BlockNumber,
    tvl_override: Option<ManualValue>,
    asset_overrides: BTreeMap<Address, ManualValue>,
}

impl OracleAdapter {
    pub fn new(
        access: AccessControl,
        feeds: &FeedNetwork,
        tvl_source: Address,
        stale_period: i64,
        default_lock_period: u64,
    ) -> MaptResult<Self> {
        if !feeds.contains(&tvl_source) {
            return Err(MaptError::InvalidSource);
        }
        if stale_period <= 0 {
            return Err(MaptError::InvalidStalePeriod);
        }
        Ok(Self {
            access,
            tvl_source,
            asset_sources: BTreeMap::new(),
            stale_period,
            default_lock_period,
            lock_end: 0,
            tvl_override: None,
            asset_overrides: BTreeMap::new(),
        })
    }

    /// Adapter with default stale and lock periods
    pub fn with_defaults(access: AccessControl, feeds: &FeedNetwork, tvl_source: Address) -> MaptResult<Self> {
        Self::new(
            access,
            feeds,
            tvl_source,
            DEFAULT_STALE_PERIOD,
            DEFAULT_LOCK_PERIOD_BLOCKS,
        )
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn tvl_source(&self) -> &Address {
        &self.tvl_source
    }

    pub fn asset_source(&self, asset: &Address) -> Option<&Address> {
        self.asset_sources.get(asset)
    }

    pub fn stale_period(&self) -> i64 {
        self.stale_period
    }

    pub fn default_lock_period(&self) -> u64 {
        self.default_lock_period
    }

    pub fn lock_end(&self) -> BlockNumber {
        self.lock_end
    }

    pub fn is_locked(&self, env: &BlockEnv) -> bool {
        env.block_number < self.lock_end
    }

    pub fn has_tvl_override(&self, env: &BlockEnv) -> bool {
        self.tvl_override
            .map(|manual| manual.is_active(env.block_number))
            .unwrap_or(false)
    }

    pub fn has_asset_override(&self, env: &BlockEnv, asset: &Address) -> bool {
        self.asset_overrides
            .get(asset)
            .map(|manual| manual.is_active(env.block_number))
            .unwrap_or(false)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Total value locked in the LP Account, in feed units
    ///
    /// `mapt_supply` decides whether a zero answer is consistent.
    pub fn get_tvl(&self, env: &BlockEnv, feeds: &FeedNetwork, mapt_supply: u128) -> MaptResult<u128> {
        self.ensure_unlocked(env)?;

        if let Some(manual) = self.tvl_override.filter(|m| m.is_active(env.block_number)) {
            return non_negative(manual.value);
        }

        let value = self.read_feed(env, feeds, &self.tvl_source)?;
        if value == 0 && mapt_supply > 0 {
            return Err(MaptError::InvalidZeroTvl);
        }
        Ok(value)
    }

    /// USD price of one whole `asset` token, in feed units
    pub fn get_asset_price(&self, env: &BlockEnv, feeds: &FeedNetwork, asset: &Address) -> MaptResult<u128> {
        self.ensure_unlocked(env)?;

        let price = match self.asset_overrides.get(asset) {
            Some(manual) if manual.is_active(env.block_number) => non_negative(manual.value)?,
            _ => {
                let source = self
                    .asset_sources
                    .get(asset)
                    .ok_or(MaptError::MissingAssetValue)?;
                self.read_feed(env, feeds, source)?
            }
        };
        if price == 0 {
            return Err(MaptError::MissingAssetValue);
        }
        Ok(price)
    }

    fn ensure_unlocked(&self, env: &BlockEnv) -> MaptResult<()> {
        if self.is_locked(env) {
            return Err(MaptError::Locked);
        }
        Ok(())
    }

    fn read_feed(&self, env: &BlockEnv, feeds: &FeedNetwork, source: &Address) -> MaptResult<u128> {
        let round = feeds.latest(source)?;
        let value = non_negative(round.answer)?;
        let age = round.age(env.timestamp);
        if age > self.stale_period {
            debug!("Feed {} is {}s old (max {}s)", source, age, self.stale_period);
            return Err(MaptError::StaleData {
                age_seconds: age,
                max_age: self.stale_period,
            });
        }
        Ok(value)
    }

    // ========================================================================
    // Locking
    // ========================================================================

    /// Lock for the default period
    pub fn lock(&mut self, caller: &Address, env: &BlockEnv) -> MaptResult<()> {
        self.lock_for(caller, env, self.default_lock_period)
    }

    /// Lock until `block + blocks`; the lock end never moves earlier
    pub fn lock_for(&mut self, caller: &Address, env: &BlockEnv, blocks: u64) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleLock)?;
        let new_end = env.block_number.saturating_add(blocks);
        if new_end < self.lock_end {
            return Err(MaptError::CannotShortenLock);
        }
        self.lock_end = new_end;
        info!("Oracle locked by {} until block {}", caller, new_end);
        Ok(())
    }

    pub fn emergency_unlock(&mut self, caller: &Address, env: &BlockEnv) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleEmergencyUnlock)?;
        self.lock_end = env.block_number;
        info!("Oracle unlocked at block {}", env.block_number);
        Ok(())
    }

    // ========================================================================
    // Manual Overrides
    // ========================================================================

    pub fn emergency_set_tvl(
        &mut self,
        caller: &Address,
        env: &BlockEnv,
        value: i128,
        duration_blocks: u64,
    ) -> MaptResult<ManualValue> {
        self.access.authorize(caller, Operation::OracleSetTvlOverride)?;
        let manual = ManualValue {
            value,
            set_block: env.block_number,
            duration_blocks,
        };
        self.tvl_override = Some(manual);
        info!("TVL override {} until block {}", value, manual.expiry_block());
        Ok(manual)
    }

    pub fn emergency_unset_tvl(&mut self, caller: &Address, env: &BlockEnv) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleUnsetTvlOverride)?;
        if !self.has_tvl_override(env) {
            return Err(MaptError::OverrideNotSet);
        }
        self.tvl_override = None;
        info!("TVL override cleared");
        Ok(())
    }

    pub fn emergency_set_asset_value(
        &mut self,
        caller: &Address,
        env: &BlockEnv,
        asset: &Address,
        value: i128,
        duration_blocks: u64,
    ) -> MaptResult<ManualValue> {
        self.access.authorize(caller, Operation::OracleSetAssetOverride)?;
        if asset.is_empty() {
            return Err(MaptError::InvalidAddress);
        }
        let manual = ManualValue {
            value,
            set_block: env.block_number,
            duration_blocks,
        };
        self.asset_overrides.insert(asset.clone(), manual);
        info!("Asset {} override {} until block {}", asset, value, manual.expiry_block());
        Ok(manual)
    }

    pub fn emergency_unset_asset_value(&mut self, caller: &Address, env: &BlockEnv, asset: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleUnsetAssetOverride)?;
        if !self.has_asset_override(env, asset) {
            return Err(MaptError::OverrideNotSet);
        }
        self.asset_overrides.remove(asset);
        info!("Asset {} override cleared", asset);
        Ok(())
    }

    // ========================================================================
    // Sources and Parameters
    // ========================================================================

    pub fn emergency_set_tvl_source(&mut self, caller: &Address, feeds: &FeedNetwork, source: Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleSetTvlSource)?;
        if !feeds.contains(&source) {
            return Err(MaptError::InvalidSource);
        }
        info!("TVL source set to {}", source);
        self.tvl_source = source;
        Ok(())
    }

    pub fn emergency_set_asset_source(
        &mut self,
        caller: &Address,
        feeds: &FeedNetwork,
        asset: Address,
        source: Address,
    ) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleSetAssetSource)?;
        self.insert_asset_source(feeds, asset, source)
    }

    /// Batch source update; all pairs are validated before any is applied
    pub fn set_asset_sources(
        &mut self,
        caller: &Address,
        feeds: &FeedNetwork,
        assets: &[Address],
        sources: &[Address],
    ) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleSetAssetSources)?;
        if assets.len() != sources.len() {
            return Err(MaptError::lengths_must_match(assets.len(), sources.len()));
        }
        if sources.iter().any(|source| !feeds.contains(source)) {
            return Err(MaptError::InvalidSource);
        }
        for (asset, source) in assets.iter().zip(sources) {
            self.insert_asset_source(feeds, asset.clone(), source.clone())?;
        }
        Ok(())
    }

    fn insert_asset_source(&mut self, feeds: &FeedNetwork, asset: Address, source: Address) -> MaptResult<()> {
        if asset.is_empty() {
            return Err(MaptError::InvalidAddress);
        }
        if !feeds.contains(&source) {
            return Err(MaptError::InvalidSource);
        }
        info!("Asset {} source set to {}", asset, source);
        self.asset_sources.insert(asset, source);
        Ok(())
    }

    pub fn set_stale_period(&mut self, caller: &Address, stale_period: i64) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleSetStalePeriod)?;
        if stale_period <= 0 {
            return Err(MaptError::InvalidStalePeriod);
        }
        self.stale_period = stale_period;
        info!("Stale period set to {}s", stale_period);
        Ok(())
    }

    pub fn set_default_lock_period(&mut self, caller: &Address, blocks: u64) -> MaptResult<()> {
        self.access.authorize(caller, Operation::OracleSetDefaultLockPeriod)?;
        self.default_lock_period = blocks;
        info!("Default lock period set to {} blocks", blocks);
        Ok(())
    }
}

fn non_negative(value: i128) -> MaptResult<u128> {
    u128::try_from(value).map_err(|_| MaptError::NegativeValue)
}
