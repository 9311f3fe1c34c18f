//! Oracle adapter entry points.

use crate::errors::MaptResult;
use crate::events::ProtocolEvent;
use crate::types::Address;

use super::Protocol;

impl Protocol {
    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get_tvl(&self) -> MaptResult<u128> {
        self.oracle
            .get_tvl(&self.env, &self.feeds, self.mapt.total_supply())
    }

    pub fn get_asset_price(&self, asset: &Address) -> MaptResult<u128> {
        self.oracle.get_asset_price(&self.env, &self.feeds, asset)
    }

    pub fn is_oracle_locked(&self) -> bool {
        self.oracle.is_locked(&self.env)
    }

    pub fn has_tvl_override(&self) -> bool {
        self.oracle.has_tvl_override(&self.env)
    }

    pub fn has_asset_override(&self, asset: &Address) -> bool {
        self.oracle.has_asset_override(&self.env, asset)
    }

    // ========================================================================
    // Locking
    // ========================================================================

    pub fn oracle_lock(&mut self, caller: &Address) -> MaptResult<()> {
        self.transact("oracle lock", |p| {
            p.oracle.lock(caller, &p.env)?;
            let lock_end = p.oracle.lock_end();
            p.emit(ProtocolEvent::OracleLocked { lock_end });
            Ok(())
        })
    }

    pub fn oracle_lock_for(&mut self, caller: &Address, blocks: u64) -> MaptResult<()> {
        self.transact("oracle lockFor", |p| {
            p.oracle.lock_for(caller, &p.env, blocks)?;
            let lock_end = p.oracle.lock_end();
            p.emit(ProtocolEvent::OracleLocked { lock_end });
            Ok(())
        })
    }

    pub fn oracle_emergency_unlock(&mut self, caller: &Address) -> MaptResult<()> {
        self.transact("oracle emergencyUnlock", |p| {
            p.oracle.emergency_unlock(caller, &p.env)?;
            p.emit(ProtocolEvent::OracleUnlocked);
            Ok(())
        })
    }

    // ========================================================================
    // Manual Overrides
    // ========================================================================

    pub fn emergency_set_tvl(&mut self, caller: &Address, value: i128, duration_blocks: u64) -> MaptResult<()> {
        self.transact("emergencySetTvl", |p| {
            let manual = p.oracle.emergency_set_tvl(caller, &p.env, value, duration_blocks)?;
            p.emit(ProtocolEvent::TvlOverrideSet {
                value,
                expiry_block: manual.expiry_block(),
            });
            Ok(())
        })
    }

    pub fn emergency_unset_tvl(&mut self, caller: &Address) -> MaptResult<()> {
        self.transact("emergencyUnsetTvl", |p| {
            p.oracle.emergency_unset_tvl(caller, &p.env)?;
            p.emit(ProtocolEvent::TvlOverrideUnset);
            Ok(())
        })
    }

    pub fn emergency_set_asset_value(
        &mut self,
        caller: &Address,
        asset: &Address,
        value: i128,
        duration_blocks: u64,
    ) -> MaptResult<()> {
        self.transact("emergencySetAssetValue", |p| {
            let manual = p
                .oracle
                .emergency_set_asset_value(caller, &p.env, asset, value, duration_blocks)?;
            p.emit(ProtocolEvent::AssetOverrideSet {
                asset: asset.clone(),
                value,
                expiry_block: manual.expiry_block(),
            });
            Ok(())
        })
    }

    pub fn emergency_unset_asset_value(&mut self, caller: &Address, asset: &Address) -> MaptResult<()> {
        self.transact("emergencyUnsetAssetValue", |p| {
            p.oracle.emergency_unset_asset_value(caller, &p.env, asset)?;
            p.emit(ProtocolEvent::AssetOverrideUnset { asset: asset.clone() });
            Ok(())
        })
    }

    // ========================================================================
    // Sources and Parameters
    // ========================================================================

    pub fn emergency_set_tvl_source(&mut self, caller: &Address, source: &Address) -> MaptResult<()> {
        self.transact("emergencySetTvlSource", |p| {
            p.oracle.emergency_set_tvl_source(caller, &p.feeds, source.clone())?;
            p.emit(ProtocolEvent::TvlSourceChanged { source: source.clone() });
            Ok(())
        })
    }

    pub fn emergency_set_asset_source(&mut self, caller: &Address, asset: &Address, source: &Address) -> MaptResult<()> {
        self.transact("emergencySetAssetSource", |p| {
            p.oracle
                .emergency_set_asset_source(caller, &p.feeds, asset.clone(), source.clone())?;
            p.emit(ProtocolEvent::AssetSourceChanged {
                asset: asset.clone(),
                source: source.clone(),
            });
            Ok(())
        })
    }

    pub fn set_asset_sources(&mut self, caller: &Address, assets: &[Address], sources: &[Address]) -> MaptResult<()> {
        self.transact("setAssetSources", |p| {
            p.oracle.set_asset_sources(caller, &p.feeds, assets, sources)?;
            for (asset, source) in assets.iter().zip(sources) {
                p.emit(ProtocolEvent::AssetSourceChanged {
                    asset: asset.clone(),
                    source: source.clone(),
                });
            }
            Ok(())
        })
    }

    pub fn set_stale_period(&mut self, caller: &Address, stale_period: i64) -> MaptResult<()> {
        self.transact("setStalePeriod", |p| {
            p.oracle.set_stale_period(caller, stale_period)?;
            p.emit(ProtocolEvent::StalePeriodChanged { stale_period });
            Ok(())
        })
    }

    pub fn set_default_lock_period(&mut self, caller: &Address, blocks: u64) -> MaptResult<()> {
        self.transact("setDefaultLockPeriod", |p| {
            p.oracle.set_default_lock_period(caller, blocks)?;
            p.emit(ProtocolEvent::DefaultLockPeriodChanged { blocks });
            Ok(())
        })
    }
}
