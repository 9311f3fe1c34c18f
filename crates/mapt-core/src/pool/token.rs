//! Pool token (APT) state: share ledger, locks, fees and deposit times.
//!
//! Operations that touch the underlyer, the oracle or the meta pool token
//! are orchestrated by [`crate::protocol::Protocol`]; this type owns the
//! pool-local state and its guards.

use std::collections::BTreeMap;

use tracing::info;

use crate::access::{AccessControl, Operation};
use crate::constants::{
    BPS_DENOMINATOR, DEFAULT_ARBITRAGE_FEE_BPS, DEFAULT_ARBITRAGE_FEE_PERIOD, DEFAULT_RESERVE_PERCENTAGE,
    DEFAULT_WITHDRAW_FEE_BPS, PERCENT_DENOMINATOR,
};
use crate::errors::{MaptError, MaptResult};
use crate::ledger::ShareLedger;
use crate::types::{Address, Timestamp};

/// Tunable pool parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolParams {
    pub reserve_percentage: u8,
    pub withdraw_fee_bps: u32,
    pub arbitrage_fee_bps: u32,
    /// Seconds after a deposit during which a redeem pays the arbitrage fee
    pub arbitrage_fee_period: i64,
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            reserve_percentage: DEFAULT_RESERVE_PERCENTAGE,
            withdraw_fee_bps: DEFAULT_WITHDRAW_FEE_BPS,
            arbitrage_fee_bps: DEFAULT_ARBITRAGE_FEE_BPS,
            arbitrage_fee_period: DEFAULT_ARBITRAGE_FEE_PERIOD,
        }
    }
}

impl PoolParams {
    pub fn validate(&self) -> MaptResult<()> {
        if self.reserve_percentage > PERCENT_DENOMINATOR {
            return Err(MaptError::InvalidParameter(format!(
                "reserve percentage {} above 100",
                self.reserve_percentage
            )));
        }
        if self.withdraw_fee_bps > BPS_DENOMINATOR || self.arbitrage_fee_bps > BPS_DENOMINATOR {
            return Err(MaptError::InvalidParameter("fee above 10000 bps".to_string()));
        }
        if self.arbitrage_fee_period < 0 {
            return Err(MaptError::InvalidParameter("negative arbitrage fee period".to_string()));
        }
        Ok(())
    }
}

/// Pause flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolLocks {
    /// Blocks deposits, redemptions and transfers to the LP Account
    pub paused: bool,
    pub add_liquidity_locked: bool,
    pub redeem_locked: bool,
}

#[derive(Debug, Clone)]
pub struct PoolToken {
    address: Address,
    underlyer: Address,
    access: AccessControl,
    shares: ShareLedger,
    params: PoolParams,
    locks: PoolLocks,
    last_deposit_time: BTreeMap<Address, Timestamp>,
}

impl PoolToken {
    pub fn new(address: Address, underlyer: Address, access: AccessControl, params: PoolParams) -> MaptResult<Self> {
        if address.is_empty() || underlyer.is_empty() {
            return Err(MaptError::InvalidAddress);
        }
        params.validate()?;
        Ok(Self {
            address,
            underlyer,
            access,
            shares: ShareLedger::new(),
            params,
            locks: PoolLocks::default(),
            last_deposit_time: BTreeMap::new(),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn underlyer(&self) -> &Address {
        &self.underlyer
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn locks(&self) -> &PoolLocks {
        &self.locks
    }

    pub fn shares(&self) -> &ShareLedger {
        &self.shares
    }

    pub fn total_supply(&self) -> u128 {
        self.shares.total_supply()
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.shares.balance_of(holder)
    }

    pub fn last_deposit_time(&self, holder: &Address) -> Option<Timestamp> {
        self.last_deposit_time.get(holder).copied()
    }

    /// Redeeming now would pay the arbitrage fee
    pub fn is_early_redeem(&self, holder: &Address, now: Timestamp) -> bool {
        self.last_deposit_time(holder)
            .map(|deposited| now.saturating_sub(deposited) < self.params.arbitrage_fee_period)
            .unwrap_or(false)
    }

    // ========================================================================
    // Guards
    // ========================================================================

    pub fn ensure_not_paused(&self) -> MaptResult<()> {
        if self.locks.paused {
            return Err(MaptError::Paused);
        }
        Ok(())
    }

    pub fn ensure_can_add_liquidity(&self) -> MaptResult<()> {
        self.ensure_not_paused()?;
        if self.locks.add_liquidity_locked {
            return Err(MaptError::AddLiquidityLocked);
        }
        Ok(())
    }

    pub fn ensure_can_redeem(&self) -> MaptResult<()> {
        self.ensure_not_paused()?;
        if self.locks.redeem_locked {
            return Err(MaptError::RedeemLocked);
        }
        Ok(())
    }

    /// Only the meta pool token may move underlyer to the LP Account
    pub fn authorize_transfer_to_lp_account(&self, caller: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolTransferToLpAccount)?;
        self.ensure_not_paused()
    }

    // ========================================================================
    // Share Ledger
    // ========================================================================

    pub(crate) fn record_deposit(&mut self, holder: &Address, shares: u128, now: Timestamp) -> MaptResult<()> {
        self.shares.mint(holder, shares)?;
        self.last_deposit_time.insert(holder.clone(), now);
        Ok(())
    }

    pub(crate) fn burn_shares(&mut self, holder: &Address, shares: u128) -> MaptResult<()> {
        self.shares.burn(holder, shares)
    }

    // ========================================================================
    // Emergency Locks
    // ========================================================================

    pub fn emergency_lock(&mut self, caller: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolEmergencyLock)?;
        self.locks.paused = true;
        info!("Pool {} paused", self.address);
        Ok(())
    }

    pub fn emergency_unlock(&mut self, caller: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolEmergencyLock)?;
        self.locks.paused = false;
        info!("Pool {} unpaused", self.address);
        Ok(())
    }

    pub fn lock_add_liquidity(&mut self, caller: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolLockAddLiquidity)?;
        self.locks.add_liquidity_locked = true;
        info!("Pool {} deposits locked", self.address);
        Ok(())
    }

    pub fn unlock_add_liquidity(&mut self, caller: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolLockAddLiquidity)?;
        self.locks.add_liquidity_locked = false;
        info!("Pool {} deposits unlocked", self.address);
        Ok(())
    }

    pub fn lock_redeem(&mut self, caller: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolLockRedeem)?;
        self.locks.redeem_locked = true;
        info!("Pool {} redemptions locked", self.address);
        Ok(())
    }

    pub fn unlock_redeem(&mut self, caller: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolLockRedeem)?;
        self.locks.redeem_locked = false;
        info!("Pool {} redemptions unlocked", self.address);
        Ok(())
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    pub fn set_reserve_percentage(&mut self, caller: &Address, reserve_percentage: u8) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolSetReservePercentage)?;
        let params = PoolParams {
            reserve_percentage,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        info!("Pool {} reserve percentage set to {}", self.address, reserve_percentage);
        Ok(())
    }

    pub fn set_withdraw_fee(&mut self, caller: &Address, withdraw_fee_bps: u32) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolSetWithdrawFee)?;
        let params = PoolParams {
            withdraw_fee_bps,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        info!("Pool {} withdraw fee set to {} bps", self.address, withdraw_fee_bps);
        Ok(())
    }

    pub fn set_arbitrage_fee(&mut self, caller: &Address, arbitrage_fee_bps: u32, period: i64) -> MaptResult<()> {
        self.access.authorize(caller, Operation::PoolSetArbitrageFee)?;
        let params = PoolParams {
            arbitrage_fee_bps,
            arbitrage_fee_period: period,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        info!(
            "Pool {} arbitrage fee set to {} bps over {}s",
            self.address, arbitrage_fee_bps, period
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;

    fn pool() -> (PoolToken, Address, Address, Address) {
        let emergency = Address::from("emergencySafe");
        let admin = Address::from("adminSafe");
        let mapt = Address::from("mApt");
        let mut access = AccessControl::new();
        access.grant_role(Role::Emergency, emergency.clone());
        access.grant_role(Role::Admin, admin.clone());
        access.grant_role(Role::Contract, mapt.clone());
        let pool = PoolToken::new(
            Address::from("daiPool"),
            Address::from("DAI"),
            access,
            PoolParams::default(),
        )
        .unwrap();
        (pool, emergency, admin, mapt)
    }

    #[test]
    fn test_pause_blocks_everything() {
        let (mut pool, emergency, _, mapt) = pool();
        pool.emergency_lock(&emergency).unwrap();
        assert_eq!(pool.ensure_can_add_liquidity(), Err(MaptError::Paused));
        assert_eq!(pool.ensure_can_redeem(), Err(MaptError::Paused));
        assert_eq!(pool.authorize_transfer_to_lp_account(&mapt), Err(MaptError::Paused));

        pool.emergency_unlock(&emergency).unwrap();
        assert!(pool.authorize_transfer_to_lp_account(&mapt).is_ok());
    }

    #[test]
    fn test_independent_locks() {
        let (mut pool, emergency, admin, _) = pool();
        pool.lock_add_liquidity(&emergency).unwrap();
        assert_eq!(pool.ensure_can_add_liquidity(), Err(MaptError::AddLiquidityLocked));
        assert!(pool.ensure_can_redeem().is_ok());

        pool.lock_redeem(&emergency).unwrap();
        assert_eq!(pool.ensure_can_redeem(), Err(MaptError::RedeemLocked));

        assert_eq!(pool.lock_redeem(&admin), Err(MaptError::NotEmergencyRole));
    }

    #[test]
    fn test_transfer_requires_mapt() {
        let (pool, emergency, _, _) = pool();
        assert_eq!(
            pool.authorize_transfer_to_lp_account(&emergency),
            Err(MaptError::NotContractRole)
        );
    }

    #[test]
    fn test_early_redeem_window() {
        let (mut pool, _, admin, _) = pool();
        let alice = Address::from("alice");
        assert!(!pool.is_early_redeem(&alice, 0));

        pool.record_deposit(&alice, 10, 1_000).unwrap();
        assert!(pool.is_early_redeem(&alice, 1_000 + 3_600));
        assert!(!pool.is_early_redeem(&alice, 1_000 + DEFAULT_ARBITRAGE_FEE_PERIOD));

        pool.set_arbitrage_fee(&admin, 12, 12 * 3_600).unwrap();
        assert!(!pool.is_early_redeem(&alice, 1_000 + 12 * 3_600));
    }

    #[test]
    fn test_parameter_validation() {
        let (mut pool, emergency, admin, _) = pool();
        assert!(pool.set_reserve_percentage(&admin, 101).is_err());
        assert_eq!(pool.params().reserve_percentage, DEFAULT_RESERVE_PERCENTAGE);
        assert!(pool.set_withdraw_fee(&admin, 10_001).is_err());
        assert_eq!(pool.set_withdraw_fee(&emergency, 5), Err(MaptError::NotAdminRole));

        pool.set_reserve_percentage(&admin, 10).unwrap();
        assert_eq!(pool.params().reserve_percentage, 10);
    }
}
