//! # Rebalancing
//!
//! Capital moves between pools and the LP Account only through the meta
//! pool token. Moving capital out of a pool mints mAPT to it; moving
//! capital back burns mAPT from it.
//!
//! Batch flow:
//! 1. Resolve pools and register their underlyers with the allocation
//!    registry
//! 2. Compute every delta against one TVL snapshot
//! 3. Per pool: mint then transfer out, or burn then transfer back
//! 4. Lock the oracle for the default period so no read sees a TVL that
//!    predates the transfers
//!
//! Any failure reverts the whole batch.

use tracing::{debug, info};

use crate::access::Operation;
use crate::allocation::TokenData;
use crate::errors::{MaptError, MaptResult};
use crate::events::ProtocolEvent;
use crate::mapt::{calculate_amounts_to_withdraw, calculate_delta, get_fund_amounts};
use crate::types::Address;

use super::Protocol;

impl Protocol {
    // ========================================================================
    // Views
    // ========================================================================

    /// Reserve top-ups for the pools behind `pool_ids`
    pub fn get_rebalance_amounts(&self, pool_ids: &[String]) -> MaptResult<(Vec<Address>, Vec<i128>)> {
        let pools = self.resolve_pools(pool_ids)?;
        let amounts = pools
            .iter()
            .map(|pool| self.get_reserve_top_up_value(pool))
            .collect::<MaptResult<Vec<_>>>()?;
        Ok((pools, amounts))
    }

    /// LP Account holdings of each pool's underlyer
    pub fn get_lp_account_balances(&self, pool_ids: &[String]) -> MaptResult<Vec<u128>> {
        let pools = self.resolve_pools(pool_ids)?;
        self.lp_account_balances(&pools)
    }

    fn lp_account_balances(&self, pools: &[Address]) -> MaptResult<Vec<u128>> {
        let lp_account = self.lp_account.address();
        pools
            .iter()
            .map(|pool| {
                let underlyer = self.pool(pool)?.underlyer();
                self.tokens.balance_of(underlyer, lp_account)
            })
            .collect()
    }

    /// mAPT deltas for moving `amounts` of each pool's underlyer
    ///
    /// Every delta uses the same TVL and supply, read once up front.
    pub fn calculate_deltas(&self, pools: &[Address], amounts: &[u128]) -> MaptResult<Vec<u128>> {
        if pools.len() != amounts.len() {
            return Err(MaptError::lengths_must_match(pools.len(), amounts.len()));
        }
        let total_supply = self.mapt.total_supply();
        let tvl = if total_supply == 0 { 0 } else { self.get_tvl()? };

        pools
            .iter()
            .zip(amounts)
            .map(|(pool, amount)| {
                let underlyer = self.pool(pool)?.underlyer();
                let price = self.get_asset_price(underlyer)?;
                let decimals = self.tokens.decimals(underlyer)?;
                let delta = calculate_delta(*amount, price, decimals, tvl, total_supply)?;
                debug!("Delta for {} moving {}: {} mAPT", pool, amount, delta);
                Ok(delta)
            })
            .collect()
    }

    fn resolve_pools(&self, pool_ids: &[String]) -> MaptResult<Vec<Address>> {
        pool_ids.iter().map(|id| self.resolve_pool(id)).collect()
    }

    // ========================================================================
    // Oracle-Driven Rebalances
    // ========================================================================

    /// Send each pool's reserve surplus to the LP Account
    pub fn fund_lp_account(&mut self, caller: &Address, pool_ids: &[String]) -> MaptResult<Vec<u128>> {
        self.transact("fundLpAccount", |p| {
            p.mapt.authorize(caller, Operation::FundLpAccount)?;
            let (pools, top_ups) = p.get_rebalance_amounts(pool_ids)?;
            let amounts = get_fund_amounts(&top_ups);
            p.register_pool_underlyers(&pools)?;
            p.multiple_mint_and_transfer(&pools, &amounts)?;
            Ok(amounts)
        })
    }

    /// Pull each pool's reserve shortfall back from the LP Account, capped
    /// at what the LP Account holds
    pub fn withdraw_from_lp_account(&mut self, caller: &Address, pool_ids: &[String]) -> MaptResult<Vec<u128>> {
        self.transact("withdrawFromLpAccount", |p| {
            p.mapt.authorize(caller, Operation::WithdrawFromLpAccount)?;
            let (pools, top_ups) = p.get_rebalance_amounts(pool_ids)?;
            let available = p.lp_account_balances(&pools)?;
            let amounts = calculate_amounts_to_withdraw(&top_ups, &available)?;
            p.register_pool_underlyers(&pools)?;
            p.multiple_burn_and_transfer(&pools, &amounts)?;
            Ok(amounts)
        })
    }

    // ========================================================================
    // Emergency Rebalances
    // ========================================================================

    /// Send caller-chosen amounts from `pools` to the LP Account
    pub fn emergency_fund_lp_account(&mut self, caller: &Address, pools: &[Address], amounts: &[u128]) -> MaptResult<()> {
        self.transact("emergencyFundLpAccount", |p| {
            p.mapt.authorize(caller, Operation::EmergencyFundLpAccount)?;
            p.ensure_pools(pools, amounts)?;
            p.register_pool_underlyers(pools)?;
            p.multiple_mint_and_transfer(pools, amounts)
        })
    }

    /// Pull caller-chosen amounts from the LP Account back to `pools`
    pub fn emergency_withdraw_from_lp_account(
        &mut self,
        caller: &Address,
        pools: &[Address],
        amounts: &[u128],
    ) -> MaptResult<()> {
        self.transact("emergencyWithdrawFromLpAccount", |p| {
            p.mapt.authorize(caller, Operation::EmergencyWithdrawFromLpAccount)?;
            p.ensure_pools(pools, amounts)?;
            p.register_pool_underlyers(pools)?;
            p.multiple_burn_and_transfer(pools, amounts)
        })
    }

    fn ensure_pools(&self, pools: &[Address], amounts: &[u128]) -> MaptResult<()> {
        if pools.len() != amounts.len() {
            return Err(MaptError::lengths_must_match(pools.len(), amounts.len()));
        }
        for pool in pools {
            self.pool(pool)?;
        }
        Ok(())
    }

    // ========================================================================
    // LP Account
    // ========================================================================

    /// Move underlyer from the LP Account back to `pool` (meta pool token only)
    pub fn lp_account_transfer_to_pool(&mut self, caller: &Address, pool: &Address, amount: u128) -> MaptResult<()> {
        self.transact("transferToPool", |p| {
            p.lp_account.authorize_transfer_to_pool(caller)?;
            let underlyer = p.pool(pool)?.underlyer().clone();
            let lp_account = p.lp_account.address().clone();
            p.tokens.transfer(&underlyer, &lp_account, pool, amount)?;
            p.emit(ProtocolEvent::WithdrawnFromLpAccount {
                pool: pool.clone(),
                token: underlyer,
                amount,
            });
            Ok(())
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Idempotently add each pool's underlyer to the allocation registry
    fn register_pool_underlyers(&mut self, pools: &[Address]) -> MaptResult<()> {
        let mapt = self.mapt.address().clone();
        for pool in pools {
            let underlyer = self.pool(pool)?.underlyer().clone();
            if self.allocation.is_token_registered(&underlyer) {
                continue;
            }
            let info = self.tokens.info(&underlyer)?.clone();
            self.allocation.register_erc20_token(
                &mapt,
                TokenData {
                    token: underlyer.clone(),
                    symbol: info.symbol.clone(),
                    decimals: info.decimals,
                },
            )?;
            self.emit(ProtocolEvent::Erc20Registered {
                token: underlyer,
                symbol: info.symbol,
                decimals: info.decimals,
            });
        }
        Ok(())
    }

    fn multiple_mint_and_transfer(&mut self, pools: &[Address], amounts: &[u128]) -> MaptResult<()> {
        let deltas = self.calculate_deltas(pools, amounts)?;
        for ((pool, amount), delta) in pools.iter().zip(amounts).zip(deltas) {
            self.mint_and_transfer(pool, delta, *amount)?;
        }
        self.lock_oracle_after_rebalance()
    }

    fn multiple_burn_and_transfer(&mut self, pools: &[Address], amounts: &[u128]) -> MaptResult<()> {
        let deltas = self.calculate_deltas(pools, amounts)?;
        for ((pool, amount), delta) in pools.iter().zip(amounts).zip(deltas) {
            self.burn_and_transfer(pool, delta, *amount)?;
        }
        self.lock_oracle_after_rebalance()
    }

    fn mint_and_transfer(&mut self, pool: &Address, mint_amount: u128, transfer_amount: u128) -> MaptResult<()> {
        if mint_amount == 0 {
            return Ok(());
        }
        self.mapt.mint(pool, mint_amount)?;
        self.emit(ProtocolEvent::MaptMinted {
            pool: pool.clone(),
            amount: mint_amount,
        });
        let mapt = self.mapt.address().clone();
        self.transfer_to_lp_account(&mapt, pool, transfer_amount)?;
        info!(
            "Funded LP Account with {} from {} for {} mAPT",
            transfer_amount, pool, mint_amount
        );
        Ok(())
    }

    fn burn_and_transfer(&mut self, pool: &Address, burn_amount: u128, transfer_amount: u128) -> MaptResult<()> {
        if burn_amount == 0 {
            return Ok(());
        }
        self.mapt.burn(pool, burn_amount)?;
        self.emit(ProtocolEvent::MaptBurned {
            pool: pool.clone(),
            amount: burn_amount,
        });
        let mapt = self.mapt.address().clone();
        self.lp_account_transfer_to_pool(&mapt, pool, transfer_amount)?;
        info!(
            "Withdrew {} from LP Account to {} for {} mAPT",
            transfer_amount, pool, burn_amount
        );
        Ok(())
    }

    fn lock_oracle_after_rebalance(&mut self) -> MaptResult<()> {
        let mapt = self.mapt.address().clone();
        self.oracle.lock(&mapt, &self.env)?;
        let lock_end = self.oracle.lock_end();
        self.emit(ProtocolEvent::OracleLocked { lock_end });
        Ok(())
    }
}
